//! `depconf verify` command

use std::sync::Arc;

use anyhow::Result;

use crate::cli::VerifyArgs;
use crate::commands::{load_settings, Failed};
use depconf::ops::verify::{
    format_result, format_result_json, verify, HarnessSpec, SystemRunner, VerifyOptions,
};
use depconf::util::shell::Status;
use depconf::util::Shell;

pub fn execute(args: VerifyArgs, shell: &Arc<Shell>) -> Result<()> {
    let settings = load_settings()?;

    let mut request = args.dependency.request();
    request.destination = args.out;

    let mut harness = HarnessSpec::new(args.consumer);
    harness.markers = args.markers;
    harness.language = args.language;

    let mut options = VerifyOptions::new(request, harness);
    options.work_dir = args.work_dir;

    shell.status(Status::Verifying, &options.request.name);
    let result = verify(&options, &settings, &mut SystemRunner)?;

    if shell.is_json() {
        println!("{}", format_result_json(&result));
    } else {
        shell.print(format_result(&result, shell.is_verbose()));
    }

    if !result.passed {
        return Err(Failed.into());
    }
    shell.status(Status::Passed, &result.dependency);
    Ok(())
}
