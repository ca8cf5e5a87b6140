//! Check command implementation.
//!
//! Validates configuration, platform support and the target JVM.

use herakles_nmt_exporter::{CommandPlatform, NMT_SUMMARY_FLAG};

use crate::commands::collect::build_collector;
use crate::config::{validate_effective_config, Config};
use crate::startup_checks::check_requirements;

/// Validates configuration and runtime requirements.
pub fn command_check(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Herakles NMT Exporter - System Check");
    println!("========================================");

    let mut all_ok = true;

    println!("\n⚙️  Checking configuration...");
    match validate_effective_config(config) {
        Ok(_) => println!("   ✅ Configuration is valid"),
        Err(e) => {
            println!("   ❌ Configuration invalid: {}", e);
            all_ok = false;
        }
    }

    println!("\n🖥️  Checking platform, jcmd and target process...");
    let platform = match CommandPlatform::detect() {
        Ok(platform) => {
            println!("   ✅ {:?} platform", platform);
            let failures = check_requirements(config, platform);
            if failures.is_empty() {
                println!("   ✅ jcmd available, target process visible");
            }
            for failure in &failures {
                println!("   ❌ {}", failure);
                all_ok = false;
            }
            Some(platform)
        }
        Err(e) => {
            println!("   ❌ {}", e);
            all_ok = false;
            None
        }
    };

    if let (Some(platform), Some(pid)) = (platform, config.pid.as_deref()) {
        println!("\n📊 Checking Native Memory Tracking of pid {}...", pid);
        let collector = build_collector(config, platform);
        if collector.gate().is_enabled() {
            println!("   ✅ NMT summary tracking is enabled");
        } else {
            println!("   ❌ NMT is not enabled - start the JVM with {}", NMT_SUMMARY_FLAG);
            all_ok = false;
        }
    }

    println!("\n📋 Summary:");
    if all_ok {
        println!("   ✅ All checks passed - ready to collect");
        Ok(())
    } else {
        println!("   ❌ Some checks failed - please review warnings");
        std::process::exit(1);
    }
}
