use miette::{Diagnostic, GraphicalReportHandler, GraphicalTheme};

/// Renders a diagnostic the way a terminal would see it, minus the colours
pub fn render_report(diagnostic: &dyn Diagnostic) -> String {
    let mut out = String::new();
    GraphicalReportHandler::new_themed(GraphicalTheme::unicode_nocolor())
        .with_width(80)
        .render_report(&mut out, diagnostic)
        .unwrap();
    out
}

macro_rules! assert_report_contains {
    ($result:expr, $($needle:expr),+ $(,)?) => {{
        let report = $result.unwrap_err();
        let rendered = $crate::testing_tools::render_report(&*report);
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

pub(crate) use assert_report_contains;
