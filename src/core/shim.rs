//! Python prelude that keeps matplotlib figures around after the process exits.
//!
//! Every step of the prelude sits in its own `try` block, so a missing
//! matplotlib or a failed save never reaches user code.

const AUTOSAVE_PRELUDE: &str = r#"
# --- sandbox autosave shim (matplotlib) ---
try:
    import atexit
    import matplotlib
    try:
        matplotlib.use("Agg")
    except Exception:
        pass
    try:
        import matplotlib.pyplot as plt
    except Exception:
        plt = None

    def _sandbox_autosave_figs():
        try:
            if plt is None:
                return
            figs = []
            try:
                figs = [plt.figure(num) for num in plt.get_fignums()]
            except Exception:
                pass
            for idx, fig in enumerate(figs, 1):
                try:
                    fig.savefig(f"figure_{idx}.png", bbox_inches="tight")
                except Exception:
                    pass
        except Exception:
            pass

    atexit.register(_sandbox_autosave_figs)
except Exception:
    pass
# --- end autosave shim ---
"#;

/// Returns the source to execute: `code` as-is, or prefixed with the
/// autosave prelude.
pub fn wrap(code: &str, autosave: bool) -> String {
    if !autosave {
        return code.to_string();
    }

    let mut wrapped = String::with_capacity(AUTOSAVE_PRELUDE.len() + code.len() + 1);
    wrapped.push_str(AUTOSAVE_PRELUDE);
    wrapped.push('\n');
    wrapped.push_str(code);
    wrapped
}
