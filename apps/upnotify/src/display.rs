//! Session rendering and prompts

use console::{Style, Term};
use dialoguer::{theme::ColorfulTheme, Confirm};
use tokio::sync::mpsc::UnboundedSender;
use upnotify_session::{Reporter, SessionView, Stage, UserCommand};
use upnotify_types::{ChangeKind, ChangeSet, ColorChoice};

/// Decides how to answer the apply/dismiss question of an awaiting stage
struct Answerer {
    commands: UnboundedSender<UserCommand>,
    assume_yes: bool,
    answered: Vec<Stage>,
}

impl Answerer {
    fn new(commands: UnboundedSender<UserCommand>, assume_yes: bool) -> Self {
        Self {
            commands,
            assume_yes,
            answered: Vec::new(),
        }
    }

    /// Answer once per awaiting stage; `ask` is only consulted when applying is possible
    fn answer(&mut self, view: &SessionView, ask: impl FnOnce(&SessionView) -> bool) {
        if !view.stage.is_awaiting() || self.answered.contains(&view.stage) {
            return;
        }
        self.answered.push(view.stage);

        let command = if view.allow_apply && (self.assume_yes || ask(view)) {
            UserCommand::Apply
        } else {
            UserCommand::Cancel
        };
        tracing::debug!(stage = %view.stage, ?command, "answering prompt");
        let _ = self.commands.send(command);
    }
}

/// Interactive terminal reporter
pub struct ConsoleReporter {
    term: Term,
    color_choice: ColorChoice,
    answerer: Answerer,
    headline: String,
    printed: Vec<String>,
    // The last thing written is a transcript line that may be rewritten
    line_is_last: bool,
    tree_shown: bool,
}

impl ConsoleReporter {
    pub fn new(
        commands: UnboundedSender<UserCommand>,
        assume_yes: bool,
        color_choice: ColorChoice,
    ) -> Self {
        Self {
            term: Term::stdout(),
            color_choice,
            answerer: Answerer::new(commands, assume_yes),
            headline: String::new(),
            printed: Vec::new(),
            line_is_last: false,
            tree_shown: false,
        }
    }

    fn write_line(&self, line: &str) {
        if let Err(e) = self.term.write_line(line) {
            tracing::warn!(error = %e, "failed to write to terminal");
        }
    }

    fn render_headline(&mut self, view: &SessionView) {
        if view.headline == self.headline {
            return;
        }
        self.headline.clone_from(&view.headline);

        let style = if view.stage == Stage::Failed {
            Style::new().red().bold()
        } else if view.stage.is_terminal() {
            Style::new().green().bold()
        } else {
            Style::new().bold()
        };
        for line in view.headline.lines() {
            let text = self.styled(&style, line);
            self.write_line(&text);
        }
        self.line_is_last = false;
    }

    fn render_transcript(&mut self, view: &SessionView) {
        let lines = view.transcript.lines();
        for (index, line) in lines.iter().enumerate() {
            match self.printed.get(index) {
                Some(printed) if printed == line => {}
                Some(_) => {
                    // Download progress rewrote the line
                    if self.line_is_last && index + 1 == self.printed.len() {
                        let _ = self.term.clear_last_lines(1);
                    }
                    self.write_line(&format!("  {line}"));
                    self.printed[index].clone_from(line);
                    self.line_is_last = true;
                }
                None => {
                    self.write_line(&format!("  {line}"));
                    self.printed.push(line.clone());
                    self.line_is_last = true;
                }
            }
        }
    }

    fn render_change_set(&mut self, change_set: &ChangeSet) {
        if self.tree_shown {
            return;
        }
        self.tree_shown = true;
        let marker = self.styled(&Style::new().yellow(), "[security]");
        for line in change_set_tree(change_set, &marker) {
            self.write_line(&line);
        }
        self.line_is_last = false;
    }

    fn styled(&self, style: &Style, text: &str) -> String {
        if self.supports_color() {
            style.apply_to(text).to_string()
        } else {
            text.to_string()
        }
    }

    /// Check if color output is supported
    fn supports_color(&self) -> bool {
        match self.color_choice {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => self.term.features().colors_supported(),
        }
    }
}

impl Reporter for ConsoleReporter {
    fn render(&mut self, view: &SessionView) {
        if view.stage == Stage::AwaitingConfirm {
            if let Some(change_set) = view.change_set.as_ref().filter(|c| !c.is_empty()) {
                self.render_change_set(change_set);
            }
        }
        self.render_headline(view);
        self.render_transcript(view);

        self.answerer.answer(view, |view| {
            let prompt = if view.stage == Stage::AwaitingReleaseConfirm {
                "Upgrade to the new release now?"
            } else {
                "Apply the upgrade now?"
            };
            let answer = off_runtime(|| {
                Confirm::with_theme(&ColorfulTheme::default())
                    .with_prompt(prompt)
                    .default(false)
                    .interact()
            });
            match answer {
                Ok(apply) => apply,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to get user confirmation");
                    false
                }
            }
        });
    }
}

/// Run a blocking terminal interaction without stalling runner tasks
fn off_runtime<T>(interaction: impl FnOnce() -> T) -> T {
    tokio::task::block_in_place(interaction)
}

/// Reporter that prints every view as one JSON line
pub struct JsonReporter {
    answerer: Answerer,
}

impl JsonReporter {
    pub fn new(commands: UnboundedSender<UserCommand>, assume_yes: bool) -> Self {
        Self {
            answerer: Answerer::new(commands, assume_yes),
        }
    }
}

impl Reporter for JsonReporter {
    fn render(&mut self, view: &SessionView) {
        match serde_json::to_string(view) {
            Ok(json) => println!("{json}"),
            Err(e) => tracing::error!(error = %e, "failed to serialize session view"),
        }
        // Without a terminal there is nobody to ask
        self.answerer.answer(view, |_| false);
    }
}

/// Remove / Install / Upgrade groups with one indented line per package
pub fn change_set_tree(change_set: &ChangeSet, security_marker: &str) -> Vec<String> {
    let mut lines = Vec::new();
    for kind in ChangeKind::PRESENTATION_ORDER {
        let count = change_set.count(kind);
        if count == 0 {
            continue;
        }
        lines.push(format!("{} ({count})", kind.heading()));
        for change in change_set.group(kind) {
            if change.is_security {
                lines.push(format!("    {}  {security_marker}", change.label()));
            } else {
                lines.push(format!("    {}", change.label()));
            }
        }
    }
    lines
}
