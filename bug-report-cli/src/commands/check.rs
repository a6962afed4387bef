//! `bug-report check`: what the collector would find, without collecting

use super::collect::load_registry;
use crate::detection::detect;
use crate::error::Result;
use crate::host::Host;
use crate::tools::{ToolCheck, check_tools};
use std::path::Path;

pub fn run_check(registry: Option<&Path>, host: &dyn Host) -> Result<Vec<ToolCheck>> {
    let registry = load_registry(registry)?;
    let environment = detect(host);
    let checks = check_tools(&registry, host);

    println!("🐛 bug-report tool check");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Environment: {environment}");
    println!();
    print_checks(&checks);
    Ok(checks)
}

fn print_checks(checks: &[ToolCheck]) {
    println!("🔧 Diagnostic tools:");
    for check in checks {
        let status = if check.found() { "✅" } else { "❌" };
        print!("  {} {} ", status, check.executable);

        match (&check.path, &check.version) {
            (Some(path), Some(version)) => println!("({version}, {})", path.display()),
            (Some(path), None) => println!("({})", path.display()),
            (None, _) => match &check.package {
                Some(package) => println!("- not installed, package: {package}"),
                None => println!("- not installed, no package"),
            },
        }
    }

    let missing = checks.iter().filter(|c| !c.found()).count();
    println!();
    if missing == 0 {
        println!("✅ All diagnostic tools present");
    } else {
        println!("⚠️  {missing} tool(s) missing; their artifacts will be placeholders");
    }
}
