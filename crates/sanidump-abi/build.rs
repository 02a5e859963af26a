use sanidump_core::strategy::HookStrategy;

fn main() {
    println!("cargo:rustc-check-cfg=cfg(hook_strategy, values(\"dynamic\", \"wrap\"))");
    println!("cargo:rerun-if-changed=build.rs");

    let target_os = std::env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    let strategy = if std::env::var_os("CARGO_FEATURE_DYNAMIC_HOOKS").is_some() {
        HookStrategy::DynamicSymbol
    } else {
        HookStrategy::for_target_os(&target_os)
    };
    println!("cargo:rustc-cfg=hook_strategy=\"{}\"", strategy.as_str());

    // Recorded for build integrations that link the static archive.
    println!(
        "cargo:rustc-env=SANIDUMP_LINKER_FLAGS={}",
        strategy.linker_flags().join(" ")
    );
}
