use std::{env, env::VarError};

/// The server takes no arguments. Passing any prints the help text and current configuration. Returns true if the
/// help was shown.
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // PDV_JWT_SECRET and PDV_BOT_API_KEY are deliberately absent
    const DISPLAY_ENVS: [&str; 10] = [
        "RUST_LOG",
        "PDV_HOST",
        "PDV_PORT",
        "PDV_DATABASE_URL",
        "PDV_DB_MAX_CONNECTIONS",
        "PDV_DB_ACQUIRE_TIMEOUT",
        "PDV_ORDER_TIMEOUT",
        "PDV_RESTOCK_ON_CANCEL",
        "PDV_STRICT_STATUS_TRANSITIONS",
        "PDV_CART_TTL",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    });
    let secret_state = |name: &str| if env::var(name).is_ok() { "Set" } else { "Not set" };
    println!("  {:<35} {:<15}", "PDV_JWT_SECRET", secret_state("PDV_JWT_SECRET"));
    println!("  {:<35} {:<15}", "PDV_BOT_API_KEY", secret_state("PDV_BOT_API_KEY"));
}
