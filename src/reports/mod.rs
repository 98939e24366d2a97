pub mod build;

pub use build::BuildReport;

use serde::Serialize;
use tinytemplate::{error::Result, TinyTemplate};

pub trait Report: Serialize {
    fn title() -> &'static str;
    fn template() -> &'static str;

    fn generate(&self) -> Result<String> {
        let mut report = TinyTemplate::new();
        report.set_default_formatter(&tinytemplate::format_unescaped);
        report.add_template("report", Self::template())?;
        report.render("report", &self)
    }
}
