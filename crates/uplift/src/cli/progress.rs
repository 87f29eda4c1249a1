use indicatif::{ProgressBar, ProgressStyle};
use once_cell::sync::Lazy;
use uplift::{ProgressEvent, ProgressSink, Stage};

const PB_STYLE: &str =
    "{spinner:.blue} {prefix:>12.cyan.bold} [{elapsed_precise}] {wide_bar:.cyan/blue} {pos:>3}% {wide_msg}";

const TICK: &str = "⠁⠂⠄⡀⢀⠠⠐⠈ ";

const PB_CHARS: &str = "█▓▒░  ";

static PB_TEMPLATE: Lazy<Option<ProgressStyle>> = Lazy::new(|| {
    let pb_style = match ProgressStyle::with_template(PB_STYLE) {
        Ok(pb_style) => pb_style.tick_chars(TICK).progress_chars(PB_CHARS),
        Err(_) => return None,
    };

    Some(pb_style)
});

/// Draws engine progress as a single percent bar.
#[derive(Clone)]
pub struct BarSink {
    pb: ProgressBar,
}

impl BarSink {
    pub fn new() -> Self {
        let pb = ProgressBar::new(100);
        let pb = if let Some(style) = PB_TEMPLATE.as_ref() {
            pb.with_style(style.clone())
        } else {
            pb
        };
        Self { pb }
    }

    /// Leave the bar where it is; used when the engine stopped without a
    /// terminal event.
    pub fn abandon(&self) {
        if !self.pb.is_finished() {
            self.pb.abandon();
        }
    }
}

impl ProgressSink for BarSink {
    fn report(&self, event: &ProgressEvent) {
        self.pb.set_prefix(event.stage.to_string());
        self.pb.set_position(event.percent.into());
        self.pb.set_message(event.message.clone());
        match event.stage {
            Stage::Done => self.pb.finish(),
            Stage::Failed => self.pb.abandon(),
            _ => self.pb.tick(),
        }
    }
}
