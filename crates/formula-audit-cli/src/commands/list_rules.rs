//! List rules command implementation.

use formula_audit_rules::all_rules;

/// Runs the list-rules command.
pub fn run() {
    println!("Available rules:\n");
    println!(
        "{:<8} {:<24} {:<9} Description",
        "Code", "Name", "Severity"
    );
    println!("{}", "-".repeat(90));

    for rule in all_rules() {
        println!(
            "{:<8} {:<24} {:<9} {}",
            rule.code(),
            rule.name(),
            rule.default_severity().to_string(),
            rule.description()
        );
    }

    println!("\nPresets:");
    println!("  audit   - FA001, FA002 (default)");
    println!("  strict  - FA001, FA002, FA003");

    println!("\nUse --rules to filter specific rules, e.g.:");
    println!("  formula-audit check --rules deprecated-superclass,test-block-quality");
    println!("  formula-audit check --rules FA001,FA003");
}
