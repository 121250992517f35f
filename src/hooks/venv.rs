//! Virtual-environment activation injection for installed git hooks.
//!
//! The pre-commit framework writes executable hook scripts into
//! `.git/hooks/`. When git invokes them outside the shell that installed
//! them, the virtual environment is not active and the hook cannot find its
//! tools. [`patch_hooks`] rewrites each eligible hook in place, inserting an
//! activation header immediately after the interpreter directive: the
//! activation variable is set and the environment's executable directory is
//! prepended to `PATH`.
//!
//! Patching is best-effort by design: a missing hooks directory, an
//! unrecognized shebang, or an already-patched hook are all silent no-ops.
//! Matching is plain substring containment against third-party-generated
//! files — deliberately not a shell or Python parser.

use std::fs;
use std::path::Path;

use crate::error::Result;

/// Suffix of the inert sample hooks git ships; never patched.
const INERT_SUFFIX: &str = ".sample";

// ---------------------------------------------------------------------------
// EnvDescriptor
// ---------------------------------------------------------------------------

/// The target environment a hook should activate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvDescriptor {
    /// Value for the `VIRTUAL_ENV` activation variable.
    pub virtual_env: String,
    /// Directory holding the environment's executables; prepended to `PATH`.
    pub bin_dir: String,
}

impl EnvDescriptor {
    pub fn new(virtual_env: impl Into<String>, bin_dir: impl Into<String>) -> Self {
        Self {
            virtual_env: virtual_env.into(),
            bin_dir: bin_dir.into(),
        }
    }

    /// Derive the descriptor from the currently active environment
    /// (`VIRTUAL_ENV` plus its `bin/` directory). `None` when no environment
    /// is active.
    pub fn from_active_env() -> Option<Self> {
        let virtual_env = std::env::var("VIRTUAL_ENV").ok()?;
        let bin_dir = Path::new(&virtual_env)
            .join("bin")
            .to_string_lossy()
            .into_owned();
        Some(Self {
            virtual_env,
            bin_dir,
        })
    }
}

// ---------------------------------------------------------------------------
// Interpreter families
// ---------------------------------------------------------------------------

/// The hook interpreter families we know how to activate an environment for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HookFamily {
    /// `#!/usr/bin/env python3` and friends.
    Python,
    /// `#!/usr/bin/env bash` and friends.
    Bash,
    /// `#!/bin/sh` — pre-commit forces this shebang on one platform.
    Sh,
}

/// Inspect the lowercased first line for the known family markers, in order.
/// Anything else is left untouched.
fn detect_family(first_line: &str) -> Option<HookFamily> {
    let lower = first_line.to_lowercase();
    if lower.contains("python") {
        Some(HookFamily::Python)
    } else if lower.contains("bash") {
        Some(HookFamily::Bash)
    } else if lower.contains("/bin/sh") {
        Some(HookFamily::Sh)
    } else {
        None
    }
}

/// Compose the activation header lines for a family.
fn activation_header(family: HookFamily, env: &EnvDescriptor) -> Vec<String> {
    match family {
        HookFamily::Python => vec![
            "import os".to_string(),
            format!(
                "os.environ[\"VIRTUAL_ENV\"] = {}",
                python_quote(&env.virtual_env)
            ),
            "os.environ[\"PATH\"] = os.pathsep.join((".to_string(),
            format!("    {},", python_quote(&env.bin_dir)),
            "    os.environ.get(\"PATH\", \"\"),".to_string(),
            "))".to_string(),
        ],
        HookFamily::Bash | HookFamily::Sh => vec![
            format!("VIRTUAL_ENV={}", shell_quote(&env.virtual_env)),
            format!("PATH={}\":$PATH\"", shell_quote(&env.bin_dir)),
        ],
    }
}

/// Python single-quoted string literal.
fn python_quote(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// POSIX shell quoting in the manner of `shlex.quote`: return the string
/// unchanged when it only contains safe characters, otherwise wrap it in
/// single quotes (with embedded single quotes spliced out).
fn shell_quote(s: &str) -> String {
    let safe = |c: char| c.is_ascii_alphanumeric() || "@%+=:,./_-".contains(c);
    if !s.is_empty() && s.chars().all(safe) {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', r#"'"'"'"#))
    }
}

// ---------------------------------------------------------------------------
// Patching
// ---------------------------------------------------------------------------

/// Patch every eligible hook in `hooks_dir` to activate `env`.
///
/// No-op (not an error) when the directory does not exist — hook
/// installation is optional and patching is a convenience. Eligible hooks
/// are regular files without the `.sample` suffix whose content starts with
/// `#!`; a hook that already references `env.bin_dir` (exact or
/// case-insensitive containment) is left byte-identical.
pub fn patch_hooks(hooks_dir: &Path, env: &EnvDescriptor) -> Result<()> {
    if !hooks_dir.is_dir() {
        return Ok(());
    }

    for entry in fs::read_dir(hooks_dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let name = match path.file_name() {
            Some(n) => n.to_string_lossy().into_owned(),
            None => continue,
        };
        if name.ends_with(INERT_SUFFIX) {
            continue;
        }

        if patch_hook_file(&path, env)? {
            tracing::info!(hook = %path.display(), "activation header inserted");
        }
    }

    Ok(())
}

/// Patch a single hook file in place. Returns `true` if the file was
/// rewritten, `false` if it was skipped for any reason.
fn patch_hook_file(path: &Path, env: &EnvDescriptor) -> Result<bool> {
    let bytes = fs::read(path)?;
    if !bytes.starts_with(b"#!") {
        return Ok(false);
    }
    let text = match String::from_utf8(bytes) {
        Ok(t) => t,
        // Binary or mangled hook — not ours to touch.
        Err(_) => return Ok(false),
    };

    if already_patched(&text, env) {
        return Ok(false);
    }

    let mut lines: Vec<&str> = text.split('\n').collect();
    let family = match lines.first().and_then(|l| detect_family(l)) {
        Some(f) => f,
        None => return Ok(false),
    };

    let header = activation_header(family, env);
    let mut header_refs: Vec<&str> = header.iter().map(String::as_str).collect();
    let tail = lines.split_off(1);
    lines.append(&mut header_refs);
    lines.extend(tail);

    let permissions = fs::metadata(path)?.permissions();
    fs::write(path, lines.join("\n"))?;
    // Rewriting truncates in place, but restore explicitly so the hook stays
    // executable on every platform.
    fs::set_permissions(path, permissions)?;

    Ok(true)
}

/// Idempotence guard: the hook already references the environment's
/// executable directory, either verbatim or modulo case (path casing differs
/// across filesystems).
fn already_patched(text: &str, env: &EnvDescriptor) -> bool {
    text.contains(&env.bin_dir) || text.to_lowercase().contains(&env.bin_dir.to_lowercase())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
