//! Handler for `modplan check`.

use std::path::Path;

use miette::Result;

use crate::error::CliError;
use crate::output;
use crate::plan_file::PlanFile;

pub fn exec(file: &Path, only_new_items: bool) -> Result<()> {
    let resolver = PlanFile::load(file)?.into_resolver()?;
    let report = resolver.diagnose(only_new_items);

    if report.is_empty() {
        println!("{report}");
        return Ok(());
    }

    print!("{report}");
    output::status_warn("Failed", &format!("{} problem(s) in {}", report.len(), file.display()));
    Err(CliError::Problems {
        count: report.len(),
    }
    .into())
}
