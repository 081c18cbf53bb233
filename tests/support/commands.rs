//! Command helper methods for Test.

use super::Test;
use assert_cmd::Command;
use std::process::Output;

impl Test {
    /// Create an nsm command with correct environment variables.
    ///
    /// Returns a Command configured with:
    /// - HOME and NSM_HOME pointing into the temporary home directory
    /// - colors disabled and no inherited provider override
    /// - current directory set to the test project directory
    pub fn cmd(&self) -> Command {
        #[allow(deprecated)]
        let mut cmd = Command::cargo_bin("nsm").expect("failed to find nsm binary");
        cmd.env("HOME", self.home.path());
        // Windows uses USERPROFILE instead of HOME for home directory
        cmd.env("USERPROFILE", self.home.path());
        cmd.env("NSM_HOME", self.state_dir());
        cmd.env("NO_COLOR", "1");
        cmd.env_remove("NSM_PROVIDER");
        cmd.env_remove("NSM_LOG");
        cmd.current_dir(self.dir.path());
        cmd
    }

    /// Run nsm with `args`.
    pub fn run(&self, args: &[&str]) -> Output {
        self.cmd()
            .args(args)
            .output()
            .unwrap_or_else(|e| panic!("failed to run nsm {:?}: {}", args, e))
    }

    /// Shortcut for `nsm provider add <name> local --path <store>`.
    pub fn provider_add_local(&self, name: &str) -> Output {
        let store = self.store.path().to_string_lossy().to_string();
        self.run(&["provider", "add", name, "local", "--path", &store])
    }

    /// Shortcut for `nsm provider use` command.
    pub fn provider_use(&self, name: &str) -> Output {
        self.run(&["provider", "use", name])
    }

    /// Shortcut for `nsm provider list --json` command.
    pub fn provider_list_json(&self) -> Output {
        self.run(&["provider", "list", "--json"])
    }

    /// Shortcut for `nsm project create --name` command.
    pub fn project_create(&self, name: &str) -> Output {
        self.run(&["project", "create", "--name", name])
    }

    /// Shortcut for `nsm project secret add` command.
    pub fn secret_add(&self) -> Output {
        self.run(&["project", "secret", "add"])
    }

    /// Shortcut for `nsm project secret add --json` command.
    pub fn secret_add_json(&self) -> Output {
        self.run(&["project", "secret", "add", "--json"])
    }

    /// Shortcut for `nsm project secret restore` command.
    pub fn secret_restore(&self) -> Output {
        self.run(&["project", "secret", "restore"])
    }

    /// Shortcut for `nsm project secret clean --yes` command.
    pub fn secret_clean(&self) -> Output {
        self.run(&["project", "secret", "clean", "--yes"])
    }

    /// Shortcut for `nsm secrets --json` command.
    pub fn secrets_json(&self) -> Output {
        self.run(&["secrets", "--json"])
    }
}
