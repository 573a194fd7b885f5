use std::{env, env::VarError};

/// The server takes no arguments. If any are given, print the help and the current configuration, and return true.
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
    // Secrets (SF_ACCESS_KEYS, SF_MIDTRANS_SERVER_KEY) are never displayed.
    const DISPLAY_ENVS: [&str; 11] = [
        "RUST_LOG",
        "SF_HOST",
        "SF_PORT",
        "SF_DATABASE_URL",
        "SF_MIDTRANS_PRODUCTION",
        "SF_MIDTRANS_FINISH_URL",
        "SF_MIDTRANS_NOTIFICATION_URL",
        "SF_MIDTRANS_IP_WHITELIST",
        "SF_USE_X_FORWARDED_FOR",
        "SF_USE_FORWARDED",
        "SF_PENDING_PAYMENT_TIMEOUT",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
