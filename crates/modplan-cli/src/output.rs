use std::io::Write;

use console::Style;

/// Print a status line to stderr: `    Resolved 4 items`
///
/// The `label` is right-padded to 12 characters and printed in bold green.
pub fn status(label: &str, message: &str) {
    let green_bold = Style::new().green().bold();
    let _ = writeln!(
        std::io::stderr(),
        "{:>12} {message}",
        green_bold.apply_to(label),
    );
}

/// Like [`status`] but with a bold yellow label.
pub fn status_warn(label: &str, message: &str) {
    let yellow_bold = Style::new().yellow().bold();
    let _ = writeln!(
        std::io::stderr(),
        "{:>12} {message}",
        yellow_bold.apply_to(label),
    );
}

/// Style for an action word in the printed chain.
pub fn action_style(action: modplan_resolver::Action) -> Style {
    use modplan_resolver::Action;
    match action {
        Action::Install => Style::new().green(),
        Action::Upgrade => Style::new().cyan(),
        Action::Remove => Style::new().red(),
        Action::None => Style::new().dim(),
    }
}
