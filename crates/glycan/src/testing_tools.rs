use miette::{Diagnostic, GraphicalReportHandler, GraphicalTheme};

pub fn render_report(diagnostic: &dyn Diagnostic) -> String {
    let mut out = String::new();
    GraphicalReportHandler::new_themed(GraphicalTheme::unicode_nocolor())
        .with_width(100)
        .render_report(&mut out, diagnostic)
        .unwrap();
    out
}

macro_rules! assert_error_renders {
    ($result:expr, $($needle:expr),+ $(,)?) => {{
        let error = $result.unwrap_err();
        let rendered = $crate::testing_tools::render_report(&error);
        $(
            assert!(
                rendered.contains($needle),
                "expected {:?} in the report for `{}`:\n{rendered}",
                $needle,
                stringify!($result),
            );
        )+
    }};
}

pub(crate) use assert_error_renders;
