//! Learning game artifacts and score bookkeeping.

use super::preview;
use crate::error::{LearnieError, Result};
use serde::{Deserialize, Serialize};

pub const GAME_WIDTH: u32 = 700;
pub const GAME_HEIGHT: u32 = 800;
pub const MAX_SCORE: u8 = 100;

const RUNTIME_MARKER: &str = "learnie-score-runtime";

/// Script injected into every game so the embedding page can observe the score.
///
/// Exposes `window.LearnieScore` with `get`, `set`, `add`, `reset` and
/// `onChange`. The value is always clamped to 0-100.
pub const SCORE_RUNTIME: &str = r#"<script id="learnie-score-runtime">
(function () {
  var score = 0;
  var listeners = [];
  function clamp(v) {
    v = Math.round(Number(v) || 0);
    return Math.max(0, Math.min(100, v));
  }
  function emit() {
    for (var i = 0; i < listeners.length; i++) {
      try { listeners[i](score); } catch (e) {}
    }
    if (window.parent && window.parent !== window) {
      window.parent.postMessage({ type: "learnie-score", score: score }, "*");
    }
  }
  window.LearnieScore = {
    get: function () { return score; },
    set: function (v) { score = clamp(v); emit(); return score; },
    add: function (d) { score = clamp(score + (Number(d) || 0)); emit(); return score; },
    reset: function () { score = 0; emit(); return score; },
    onChange: function (fn) { if (typeof fn === "function") { listeners.push(fn); } }
  };
})();
</script>
"#;

/// A self-contained HTML document implementing a learning game.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameArtifact {
    html: String,
}

impl GameArtifact {
    /// Check the raw model output and add the score runtime.
    pub fn from_model_output(raw: &str) -> Result<Self> {
        let html = raw.trim();

        if html.starts_with("```") {
            return Err(LearnieError::violation(
                "game HTML is wrapped in a fenced code block",
            ));
        }

        // ASCII lowercasing keeps byte offsets aligned with `html`.
        let lower = html.to_ascii_lowercase();
        if !lower.starts_with("<!doctype html") && !lower.starts_with("<html") {
            return Err(LearnieError::violation(format!(
                "game output must be a single HTML document starting with <!DOCTYPE html>. Response was: {}",
                preview(html)
            )));
        }
        if !lower.ends_with("</html>") {
            return Err(LearnieError::violation(
                "game output must end with </html> and contain nothing after it",
            ));
        }
        if !lower.contains("<button") {
            return Err(LearnieError::violation(
                "game must have a start screen with a start button",
            ));
        }
        if !lower.contains("100") {
            return Err(LearnieError::violation(
                "game must state the objective of reaching a score of 100",
            ));
        }

        Ok(Self {
            html: inject_runtime(html, &lower),
        })
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn into_html(self) -> String {
        self.html
    }
}

fn inject_runtime(html: &str, lower: &str) -> String {
    if lower.contains(RUNTIME_MARKER) {
        return html.to_string();
    }

    let position = lower.find("</head>").or_else(|| {
        lower
            .find("<html")
            .and_then(|start| lower[start..].find('>').map(|end| start + end + 1))
    });

    match position {
        Some(at) => {
            let mut out = String::with_capacity(html.len() + SCORE_RUNTIME.len());
            out.push_str(&html[..at]);
            out.push_str(SCORE_RUNTIME);
            out.push_str(&html[at..]);
            out
        }
        None => format!("{}{}", SCORE_RUNTIME, html),
    }
}

/// An in-game scoring event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "points", rename_all = "snake_case")]
pub enum PlayEvent {
    Award(i32),
    Penalty(i32),
    Set(i64),
    Reset,
}

/// A game score, always within 0 and [`MAX_SCORE`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "i64", into = "u8")]
pub struct GameScore(u8);

impl GameScore {
    pub fn new(value: i64) -> Self {
        Self(value.clamp(0, MAX_SCORE as i64) as u8)
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn is_won(&self) -> bool {
        self.0 >= MAX_SCORE
    }

    /// Apply an event and return the new score.
    pub fn apply(&mut self, event: PlayEvent) -> u8 {
        let current = self.0 as i64;
        *self = match event {
            PlayEvent::Award(points) => Self::new(current + points as i64),
            PlayEvent::Penalty(points) => Self::new(current - points as i64),
            PlayEvent::Set(value) => Self::new(value),
            PlayEvent::Reset => Self::default(),
        };
        self.0
    }
}

impl From<i64> for GameScore {
    fn from(value: i64) -> Self {
        Self::new(value)
    }
}

impl From<GameScore> for u8 {
    fn from(score: GameScore) -> Self {
        score.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GAME: &str = "<!DOCTYPE html>\n<html>\n<head><title>Match Attack</title></head>\n\
        <body><div id=\"start\"><p>Reach score 100</p><button>Start</button></div></body>\n</html>";

    #[test]
    fn test_accepts_document_and_injects_runtime() {
        let game = GameArtifact::from_model_output(GAME).unwrap();
        let html = game.html();
        assert!(html.contains("window.LearnieScore"));
        let runtime_at = html.find(RUNTIME_MARKER).unwrap();
        assert!(runtime_at < html.find("</head>").unwrap());
        assert!(html.starts_with("<!DOCTYPE html>"));
    }

    #[test]
    fn test_runtime_injected_once() {
        let first = GameArtifact::from_model_output(GAME).unwrap();
        let second = GameArtifact::from_model_output(first.html()).unwrap();
        assert_eq!(first.html(), second.html());
    }

    #[test]
    fn test_injects_without_head() {
        let raw = "<html lang=\"en\"><body><button>Go</button> 100</body></html>";
        let game = GameArtifact::from_model_output(raw).unwrap();
        assert!(game.html().starts_with("<html lang=\"en\"><script"));
    }

    #[test]
    fn test_injects_before_head_with_non_ascii_text() {
        let raw = "<!DOCTYPE html><html><head><title>İstanbul</title></head>\
            <body><button>Start</button>ẞ reach 100</body></html>";
        let game = GameArtifact::from_model_output(raw).unwrap();
        let html = game.html();
        assert!(html.contains("<title>İstanbul</title><script"));
        assert!(html.contains("</script>\n</head><body>"));
        assert!(html.ends_with("ẞ reach 100</body></html>"));
    }

    #[test]
    fn test_injects_before_uppercase_head_after_multibyte_text() {
        let raw = "<!DOCTYPE html><HTML><HEAD><TITLE>Café</TITLE>é</HEAD>\
            <BODY><BUTTON>Start</BUTTON> 100</BODY></HTML>";
        let game = GameArtifact::from_model_output(raw).unwrap();
        let html = game.html();
        assert!(html.contains("</TITLE>é<script"));
        assert!(html.contains("</script>\n</HEAD><BODY>"));
    }

    #[test]
    fn test_rejects_fenced_html() {
        let raw = format!("```html\n{}\n```", GAME);
        assert!(GameArtifact::from_model_output(&raw).is_err());
    }

    #[test]
    fn test_rejects_trailing_text() {
        let raw = format!("{}\nEnjoy the game!", GAME);
        assert!(GameArtifact::from_model_output(&raw).is_err());
    }

    #[test]
    fn test_rejects_missing_start_button() {
        let raw = "<!DOCTYPE html><html><body>Reach 100</body></html>";
        assert!(GameArtifact::from_model_output(raw).is_err());
    }

    #[test]
    fn test_score_clamped() {
        let mut score = GameScore::default();
        assert_eq!(score.apply(PlayEvent::Penalty(10)), 0);
        assert_eq!(score.apply(PlayEvent::Award(60)), 60);
        assert_eq!(score.apply(PlayEvent::Award(60)), 100);
        assert!(score.is_won());
        assert_eq!(score.apply(PlayEvent::Set(-5)), 0);
        assert_eq!(score.apply(PlayEvent::Set(42)), 42);
        assert_eq!(score.apply(PlayEvent::Reset), 0);
    }

    #[test]
    fn test_score_deserialize_clamps() {
        let score: GameScore = serde_json::from_str("250").unwrap();
        assert_eq!(score.value(), 100);
        assert_eq!(serde_json::to_string(&GameScore::new(7)).unwrap(), "7");
    }
}
