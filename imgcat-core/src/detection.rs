// ABOUTME: Terminal capability detection for iTerm2 inline image support
// ABOUTME: Decides whether images can be shown and whether tmux passthrough is needed

use crate::error::{ImgcatError, Result};
use crate::frame::Passthrough;
use std::env;

/// Environment variable that overrides detection: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off`.
pub const FORCE_INLINE_VAR: &str = "IMGCAT_FORCE_INLINE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalCapabilities {
    pub supports_inline_images: bool,
    pub passthrough: Passthrough,
    pub terminal_name: String,
}

/// The environment variables detection looks at, captured once.
#[derive(Debug, Clone, Default)]
pub struct EnvVars {
    pub force_inline: Option<String>,
    pub term_program: String,
    pub lc_terminal: String,
    pub term: String,
    pub tmux: Option<String>,
}

impl EnvVars {
    pub fn from_process() -> Self {
        Self {
            force_inline: env::var(FORCE_INLINE_VAR).ok(),
            term_program: env::var("TERM_PROGRAM").unwrap_or_default(),
            lc_terminal: env::var("LC_TERMINAL").unwrap_or_default(),
            term: env::var("TERM").unwrap_or_default(),
            tmux: env::var("TMUX").ok(),
        }
    }
}

impl TerminalCapabilities {
    /// Read the process environment once and detect.
    pub fn detect() -> Self {
        Self::from_env_vars(&EnvVars::from_process())
    }

    pub fn from_env_vars(vars: &EnvVars) -> Self {
        let passthrough = detect_passthrough(vars);
        let terminal_name = determine_terminal_name(vars);

        if let Some(forced) = vars.force_inline.as_deref() {
            match parse_force(forced) {
                Some(supported) => {
                    return Self {
                        supports_inline_images: supported,
                        passthrough,
                        terminal_name: format!("forced-{}", if supported { "on" } else { "off" }),
                    };
                }
                None => log::warn!(
                    "Ignoring unknown {} value '{}'. Valid values: 1, 0, true, false",
                    FORCE_INLINE_VAR,
                    forced
                ),
            }
        }

        Self {
            supports_inline_images: detect_iterm2_support(vars),
            passthrough,
            terminal_name,
        }
    }

    /// The support gate: an error naming the terminal when inline images cannot be shown.
    pub fn ensure_supported(&self) -> Result<()> {
        if self.supports_inline_images {
            Ok(())
        } else {
            Err(ImgcatError::Unsupported {
                terminal: self.terminal_name.clone(),
            })
        }
    }

    /// Capabilities that always pass the support gate, without multiplexer wrapping.
    pub fn forced() -> Self {
        Self {
            supports_inline_images: true,
            passthrough: Passthrough::None,
            terminal_name: "forced-on".to_string(),
        }
    }

    /// Capabilities that always fail the support gate.
    pub fn unsupported() -> Self {
        Self {
            supports_inline_images: false,
            passthrough: Passthrough::None,
            terminal_name: "forced-off".to_string(),
        }
    }
}

fn parse_force(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

fn detect_iterm2_support(vars: &EnvVars) -> bool {
    // iTerm2 itself; LC_TERMINAL survives ssh and tmux where TERM_PROGRAM does not
    if vars.term_program == "iTerm.app" || vars.lc_terminal == "iTerm2" {
        return true;
    }

    // Terminals that implement the iTerm2 image protocol
    if matches!(
        vars.term_program.as_str(),
        "WezTerm" | "mintty" | "Hyper" | "Warp" | "Tabby" | "Terminus"
    ) {
        return true;
    }

    vars.term.contains("iterm")
}

fn detect_passthrough(vars: &EnvVars) -> Passthrough {
    let in_tmux = vars.tmux.as_deref().is_some_and(|value| !value.is_empty())
        || vars.term_program == "tmux";

    if in_tmux {
        Passthrough::Tmux
    } else {
        Passthrough::None
    }
}

fn determine_terminal_name(vars: &EnvVars) -> String {
    if !vars.lc_terminal.is_empty() {
        vars.lc_terminal.clone()
    } else if !vars.term_program.is_empty() {
        vars.term_program.clone()
    } else if !vars.term.is_empty() {
        vars.term.clone()
    } else {
        "unknown".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn vars(term_program: &str, term: &str) -> EnvVars {
        EnvVars {
            term_program: term_program.to_string(),
            term: term.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_iterm2_detection() {
        let caps = TerminalCapabilities::from_env_vars(&vars("iTerm.app", "xterm-256color"));
        assert!(caps.supports_inline_images);
        assert_eq!(caps.passthrough, Passthrough::None);
        assert_eq!(caps.terminal_name, "iTerm.app");
    }

    #[test]
    fn test_compatible_terminals() {
        for program in ["WezTerm", "mintty", "Hyper", "Warp", "Tabby", "Terminus"] {
            let caps = TerminalCapabilities::from_env_vars(&vars(program, "xterm-256color"));
            assert!(caps.supports_inline_images, "{} should be supported", program);
        }

        let caps = TerminalCapabilities::from_env_vars(&vars("", "xterm-iterm2"));
        assert!(caps.supports_inline_images);
    }

    #[test]
    fn test_no_support_detection() {
        let caps = TerminalCapabilities::from_env_vars(&vars("Apple_Terminal", "xterm-256color"));
        assert!(!caps.supports_inline_images);

        let caps = TerminalCapabilities::from_env_vars(&EnvVars::default());
        assert!(!caps.supports_inline_images);
        assert_eq!(caps.terminal_name, "unknown");
    }

    #[test]
    fn test_tmux_inside_iterm2() {
        let env = EnvVars {
            term_program: "tmux".to_string(),
            lc_terminal: "iTerm2".to_string(),
            term: "screen-256color".to_string(),
            tmux: Some("/tmp/tmux-501/default,1234,0".to_string()),
            ..Default::default()
        };
        let caps = TerminalCapabilities::from_env_vars(&env);
        assert!(caps.supports_inline_images);
        assert_eq!(caps.passthrough, Passthrough::Tmux);
        assert_eq!(caps.terminal_name, "iTerm2");
    }

    #[test]
    fn test_empty_tmux_var_is_ignored() {
        let env = EnvVars {
            term_program: "iTerm.app".to_string(),
            tmux: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(
            TerminalCapabilities::from_env_vars(&env).passthrough,
            Passthrough::None
        );
    }

    #[test]
    fn test_force_override() {
        let mut env = vars("Apple_Terminal", "xterm");
        env.force_inline = Some("1".to_string());
        let caps = TerminalCapabilities::from_env_vars(&env);
        assert!(caps.supports_inline_images);
        assert_eq!(caps.terminal_name, "forced-on");

        let mut env = vars("iTerm.app", "xterm");
        env.force_inline = Some("off".to_string());
        let caps = TerminalCapabilities::from_env_vars(&env);
        assert!(!caps.supports_inline_images);
        assert_eq!(caps.terminal_name, "forced-off");
    }

    #[test]
    fn test_ensure_supported() {
        assert!(TerminalCapabilities::forced().ensure_supported().is_ok());

        let err = TerminalCapabilities::unsupported()
            .ensure_supported()
            .unwrap_err();
        assert!(err.is_unsupported());
        assert_eq!(
            err.to_string(),
            "Inline images are not supported by this terminal (forced-off)"
        );
    }

    #[test]
    fn test_unknown_force_value_falls_back() {
        let mut env = vars("iTerm.app", "xterm");
        env.force_inline = Some("maybe".to_string());
        let caps = TerminalCapabilities::from_env_vars(&env);
        assert!(caps.supports_inline_images);
        assert_eq!(caps.terminal_name, "iTerm.app");
    }

    #[test]
    #[serial]
    fn test_detect_reads_process_env() {
        let original_force = env::var(FORCE_INLINE_VAR).ok();
        let original_term_program = env::var("TERM_PROGRAM").ok();

        unsafe {
            env::remove_var(FORCE_INLINE_VAR);
            env::set_var("TERM_PROGRAM", "iTerm.app");
        }
        assert!(TerminalCapabilities::detect().supports_inline_images);

        unsafe {
            env::set_var(FORCE_INLINE_VAR, "0");
        }
        assert!(!TerminalCapabilities::detect().supports_inline_images);

        // Restore env
        unsafe {
            if let Some(val) = original_force {
                env::set_var(FORCE_INLINE_VAR, val);
            } else {
                env::remove_var(FORCE_INLINE_VAR);
            }
            if let Some(val) = original_term_program {
                env::set_var("TERM_PROGRAM", val);
            } else {
                env::remove_var("TERM_PROGRAM");
            }
        }
    }
}
