use handlebars::{no_escape, Handlebars, TemplateError};
use serde::Serialize;

use crate::error::DashboardError;

pub const INDEX_PAGE: &str = "index.html";
pub const REPORT_HTML: &str = "report.html";
pub const REGION_CHART: &str = "region_chart.svg";
pub const REPORT_TEXT: &str = "report.txt";
pub const ALERT_SUMMARY: &str = "alert_summary.txt";

/// Compiled templates. Markup templates escape every value; text templates
/// are rendered verbatim.
pub struct Templates {
    markup: Handlebars<'static>,
    text: Handlebars<'static>,
}

impl Templates {
    pub fn new() -> Result<Self, TemplateError> {
        let mut markup = Handlebars::new();
        markup.set_strict_mode(false);
        markup.register_template_string(INDEX_PAGE, include_str!("../templates/index.html.hbs"))?;
        markup.register_template_string(REPORT_HTML, include_str!("../templates/report.html.hbs"))?;
        markup.register_template_string(
            REGION_CHART,
            include_str!("../templates/region_chart.svg.hbs"),
        )?;

        let mut text = Handlebars::new();
        text.set_strict_mode(false);
        text.register_escape_fn(no_escape);
        text.register_template_string(REPORT_TEXT, include_str!("../templates/report.txt.hbs"))?;
        text.register_template_string(
            ALERT_SUMMARY,
            include_str!("../templates/alert_summary.txt.hbs"),
        )?;

        Ok(Self { markup, text })
    }

    pub fn render_markup<T: Serialize>(&self, name: &str, data: &T) -> Result<String, DashboardError> {
        self.markup
            .render(name, data)
            .map_err(|e| DashboardError::Internal(format!("failed to render {}: {}", name, e)))
    }

    pub fn render_text<T: Serialize>(&self, name: &str, data: &T) -> Result<String, DashboardError> {
        self.text
            .render(name, data)
            .map_err(|e| DashboardError::Internal(format!("failed to render {}: {}", name, e)))
    }
}
