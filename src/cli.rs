use clap::{Parser, Subcommand};

use crate::config::Secret;

#[derive(Debug, Parser)]
#[command(name = "people-notebook")]
#[command(version, about = "People Notebook service", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Default, Subcommand)]
pub enum Command {
    /// Prepare storage, seed the first administrator if needed, and serve HTTP
    #[default]
    Serve,
    /// Replace the password of an existing administrator
    RotateAdminPassword {
        #[arg(long)]
        username: String,
        #[arg(long, env = "NEW_ADMIN_PASS", hide_env_values = true)]
        password: Secret,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["people-notebook"]).expect("parse failed");
        assert!(matches!(cli.command.unwrap_or_default(), Command::Serve));
    }

    #[test]
    fn rotate_takes_username_and_password() {
        let cli = Cli::try_parse_from([
            "people-notebook",
            "rotate-admin-password",
            "--username",
            "admin",
            "--password",
            "n3w-pass",
        ])
        .expect("parse failed");

        let Some(Command::RotateAdminPassword { username, password }) = cli.command else {
            panic!("expected rotate-admin-password");
        };
        assert_eq!(username, "admin");
        assert_eq!(password.expose(), "n3w-pass");
    }

    #[test]
    fn rotate_requires_username() {
        assert!(
            Cli::try_parse_from(["people-notebook", "rotate-admin-password", "--password", "x"])
                .is_err()
        );
    }
}
