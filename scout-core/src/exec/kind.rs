//! Script classification and interpreter selection
//!
//! A script's kind is decided by its filename suffix alone, and the
//! (host, kind) pair maps to an invocation descriptor through a pure
//! function. No spawn is attempted for an unsupported pairing.

use crate::error::ScoutError;
use crate::platform::HostOs;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptKind {
    PowerShell,
    Batch,
    VbScript,
    Python,
    Shell,
    Unknown,
}

impl ScriptKind {
    /// Classify a script name by its suffix, case-insensitively.
    pub fn classify(name: &str) -> Self {
        let lower = name.to_lowercase();
        let has = |suffixes: &[&str]| suffixes.iter().any(|s| lower.ends_with(s));

        if has(&[".ps1", ".psm1", ".psd1"]) {
            ScriptKind::PowerShell
        } else if has(&[".bat", ".cmd"]) {
            ScriptKind::Batch
        } else if has(&[".vbs", ".vbscript"]) {
            ScriptKind::VbScript
        } else if has(&[".py", ".pyc"]) {
            ScriptKind::Python
        } else if has(&[".sh"]) {
            ScriptKind::Shell
        } else {
            ScriptKind::Unknown
        }
    }

    /// Canonical extension for the materialized temp file.
    pub const fn extension(&self) -> &'static str {
        match self {
            ScriptKind::PowerShell => ".ps1",
            ScriptKind::Batch => ".bat",
            ScriptKind::VbScript => ".vbs",
            ScriptKind::Python => ".py",
            ScriptKind::Shell => ".sh",
            ScriptKind::Unknown => "",
        }
    }
}

/// How to start an interpreter: the binary and the arguments inserted
/// before the script path.
#[derive(Debug, Clone, Copy)]
pub struct Invocation {
    pub program: &'static str,
    pub pre_args: &'static [&'static str],
}

/// Resolve the interpreter for `kind` on `host`.
pub fn invocation(host: HostOs, kind: ScriptKind, name: &str) -> Result<Invocation, ScoutError> {
    let unsupported = || ScoutError::UnsupportedKind {
        name: name.to_string(),
    };

    match host {
        HostOs::Windows => match kind {
            ScriptKind::PowerShell => Ok(Invocation {
                program: "powershell.exe",
                pre_args: &[
                    "-NoProfile",
                    "-ExecutionPolicy",
                    "Bypass",
                    "-NonInteractive",
                    "-File",
                ],
            }),
            ScriptKind::Batch => Ok(Invocation {
                program: "cmd.exe",
                pre_args: &["/C"],
            }),
            ScriptKind::VbScript => Ok(Invocation {
                program: "cscript.exe",
                pre_args: &[],
            }),
            ScriptKind::Python => Ok(Invocation {
                program: "python",
                pre_args: &[],
            }),
            _ => Err(unsupported()),
        },
        HostOs::Darwin | HostOs::Linux => match kind {
            ScriptKind::Shell => Ok(Invocation {
                program: "/bin/sh",
                pre_args: &[],
            }),
            ScriptKind::Python => Ok(Invocation {
                program: "python3",
                pre_args: &[],
            }),
            _ => Err(unsupported()),
        },
        HostOs::Other => Err(ScoutError::UnsupportedHost {
            os: std::env::consts::OS.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_by_suffix() {
        assert_eq!(ScriptKind::classify("a.ps1"), ScriptKind::PowerShell);
        assert_eq!(ScriptKind::classify("a.PSM1"), ScriptKind::PowerShell);
        assert_eq!(ScriptKind::classify("a.psd1"), ScriptKind::PowerShell);
        assert_eq!(ScriptKind::classify("a.bat"), ScriptKind::Batch);
        assert_eq!(ScriptKind::classify("a.CMD"), ScriptKind::Batch);
        assert_eq!(ScriptKind::classify("a.vbs"), ScriptKind::VbScript);
        assert_eq!(ScriptKind::classify("a.vbscript"), ScriptKind::VbScript);
        assert_eq!(ScriptKind::classify("a.py"), ScriptKind::Python);
        assert_eq!(ScriptKind::classify("a.pyc"), ScriptKind::Python);
        assert_eq!(ScriptKind::classify("a.sh"), ScriptKind::Shell);
        assert_eq!(ScriptKind::classify("a.txt"), ScriptKind::Unknown);
        assert_eq!(ScriptKind::classify("no-extension"), ScriptKind::Unknown);
    }

    #[test]
    fn test_unix_hosts_run_shell_and_python_only() {
        for host in [HostOs::Darwin, HostOs::Linux] {
            assert_eq!(
                invocation(host, ScriptKind::Shell, "a.sh").unwrap().program,
                "/bin/sh"
            );
            assert_eq!(
                invocation(host, ScriptKind::Python, "a.py").unwrap().program,
                "python3"
            );
            for kind in [ScriptKind::PowerShell, ScriptKind::Batch, ScriptKind::VbScript] {
                assert!(matches!(
                    invocation(host, kind, "a"),
                    Err(ScoutError::UnsupportedKind { .. })
                ));
            }
        }
    }

    #[test]
    fn test_windows_rejects_shell_and_unknown() {
        for kind in [ScriptKind::Shell, ScriptKind::Unknown] {
            assert!(matches!(
                invocation(HostOs::Windows, kind, "a"),
                Err(ScoutError::UnsupportedKind { .. })
            ));
        }
        let ps = invocation(HostOs::Windows, ScriptKind::PowerShell, "a.ps1").unwrap();
        assert_eq!(ps.program, "powershell.exe");
        assert_eq!(ps.pre_args.last(), Some(&"-File"));
    }

    #[test]
    fn test_unrecognized_host_is_unsupported() {
        assert!(matches!(
            invocation(HostOs::Other, ScriptKind::Shell, "a.sh"),
            Err(ScoutError::UnsupportedHost { .. })
        ));
    }
}
