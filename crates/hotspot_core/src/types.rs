use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// TimeUs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeUs(pub i64);

impl TimeUs {
    pub const ZERO: Self = Self(0);

    pub fn from_seconds(s: f64) -> Self {
        Self((s * 1_000_000.0).round() as i64)
    }

    /// Like `from_seconds`, but refuses NaN and infinities instead of
    /// silently saturating them.
    pub fn try_from_seconds(s: f64) -> Result<Self> {
        if s.is_finite() {
            Ok(Self::from_seconds(s))
        } else {
            Err(CoreError::MalformedNumericInput(s.to_string()))
        }
    }

    pub fn as_seconds(&self) -> f64 {
        self.0 as f64 / 1_000_000.0
    }

    pub fn clamp_to(self, lo: TimeUs, hi: TimeUs) -> Self {
        Self(self.0.max(lo.0).min(hi.0))
    }

    /// `M:SS`, as shown on the timeline and in the hotspot table.
    pub fn format_mmss(&self) -> String {
        let secs = (self.0.max(0) / 1_000_000) as u64;
        format!("{}:{:02}", secs / 60, secs % 60)
    }

    /// `MM:SS`, as shown in the time input field.
    pub fn format_mmss_padded(&self) -> String {
        let secs = (self.0.max(0) / 1_000_000) as u64;
        format!("{:02}:{:02}", secs / 60, secs % 60)
    }

    /// Parse `MM:SS` text typed into a time field.
    pub fn parse_mmss(text: &str) -> Result<Self> {
        let malformed = || CoreError::MalformedNumericInput(text.to_string());
        let (minutes, seconds) = text.trim().split_once(':').ok_or_else(malformed)?;
        let minutes: f64 = minutes.trim().parse().map_err(|_| malformed())?;
        let seconds: f64 = seconds.trim().parse().map_err(|_| malformed())?;
        if !minutes.is_finite() || !seconds.is_finite() {
            return Err(malformed());
        }
        Ok(Self::from_seconds(minutes * 60.0 + seconds))
    }
}

// Saturating: `from_seconds` maps huge inputs to the i64 extremes.
impl Add for TimeUs {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Sub for TimeUs {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl fmt::Display for TimeUs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total_us = self.0.unsigned_abs();
        let total_ms = total_us / 1_000;
        let ms = total_ms % 1_000;
        let total_secs = total_ms / 1_000;
        let secs = total_secs % 60;
        let total_mins = total_secs / 60;
        let mins = total_mins % 60;
        let hours = total_mins / 60;
        if self.0 < 0 {
            write!(f, "-{:02}:{:02}:{:02}.{:03}", hours, mins, secs, ms)
        } else {
            write!(f, "{:02}:{:02}:{:02}.{:03}", hours, mins, secs, ms)
        }
    }
}

/// Parse a CTA pause duration. Only the leading integer counts, so `"3.9"`
/// is 3 seconds and `"4s"` is 4.
pub fn parse_pause_seconds(text: &str) -> Result<i64> {
    let trimmed = text.trim_start();
    let (sign, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return Err(CoreError::MalformedNumericInput(text.to_string()));
    }
    digits[..end]
        .parse::<i64>()
        .map(|n| sign * n)
        .map_err(|_| CoreError::MalformedNumericInput(text.to_string()))
}

// ---------------------------------------------------------------------------
// Point / Size
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    pub fn is_finite(&self) -> bool {
        self.width.is_finite() && self.height.is_finite()
    }
}

// ---------------------------------------------------------------------------
// Shape / HotspotStyle
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    Rectangle,
    Circle,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HotspotStyle {
    pub background_color: String,
    pub border_color: String,
    pub border_width: u32,
}

impl Default for HotspotStyle {
    fn default() -> Self {
        Self {
            background_color: "#ef4444".to_string(),
            border_color: "#ffffff".to_string(),
            border_width: 2,
        }
    }
}

// ---------------------------------------------------------------------------
// Cta
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CtaKind {
    Url,
    Message,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum CtaAction {
    Url(String),
    Message(String),
}

impl CtaAction {
    pub fn kind(&self) -> CtaKind {
        match self {
            CtaAction::Url(_) => CtaKind::Url,
            CtaAction::Message(_) => CtaKind::Message,
        }
    }

    pub fn value(&self) -> &str {
        match self {
            CtaAction::Url(v) | CtaAction::Message(v) => v,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Cta {
    pub action: CtaAction,
    pub label: Option<String>,
    /// Seconds to hold playback when the hotspot is entered, as typed.
    pub pause_duration: Option<String>,
}

impl Cta {
    /// A freshly added CTA as the action editor creates it.
    pub fn new_default(kind: CtaKind) -> Self {
        let (action, label) = match kind {
            CtaKind::Url => (CtaAction::Url("https://".to_string()), "Visit Link"),
            CtaKind::Message => (
                CtaAction::Message("Enter your message here".to_string()),
                "Show Info",
            ),
        };
        Self {
            action,
            label: Some(label.to_string()),
            pause_duration: Some("0".to_string()),
        }
    }

    pub fn label_or_default(&self) -> &str {
        match self.label.as_deref() {
            Some(label) if !label.is_empty() => label,
            _ => match self.action {
                CtaAction::Url(_) => "Visit Link",
                CtaAction::Message(_) => "Show Message",
            },
        }
    }

    /// Auto-pause length in whole seconds, if this CTA asks for one.
    pub fn auto_pause_seconds(&self) -> Option<u64> {
        let text = self.pause_duration.as_deref()?;
        match parse_pause_seconds(text) {
            Ok(n) if n > 0 => Some(n as u64),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Hotspot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Hotspot {
    pub id: Uuid,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub start_time: TimeUs,
    pub end_time: TimeUs,
    pub shape: Shape,
    pub opacity: f64,
    pub is_active: bool,
    pub ctas: Vec<Cta>,
    pub style: HotspotStyle,
}

impl Hotspot {
    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Whether `t` falls inside the window, both ends inclusive. A window
    /// with `start >= end` contains nothing.
    pub fn contains_time(&self, t: TimeUs) -> bool {
        self.start_time < self.end_time && self.start_time <= t && t <= self.end_time
    }

    /// Name shown in tooltips and the table.
    pub fn display_name(&self, prefix: &str) -> String {
        if !self.name.is_empty() {
            return self.name.clone();
        }
        match self.ctas.first() {
            Some(cta) => match cta.label.as_deref() {
                Some(label) if !label.is_empty() => label.to_string(),
                _ => match cta.action {
                    CtaAction::Message(_) => "Message Hotspot".to_string(),
                    CtaAction::Url(_) => "Link Hotspot".to_string(),
                },
            },
            None => format!("{} {}", prefix, &self.id.simple().to_string()[..8]),
        }
    }
}

// ---------------------------------------------------------------------------
// HotspotSet
// ---------------------------------------------------------------------------

/// The ordered hotspot collection. Order matters: the first matching hotspot
/// wins when several want to fire on the same tick.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(transparent)]
pub struct HotspotSet {
    pub hotspots: Vec<Hotspot>,
}

impl HotspotSet {
    pub fn new(hotspots: Vec<Hotspot>) -> Self {
        Self { hotspots }
    }

    pub fn get(&self, id: Uuid) -> Option<&Hotspot> {
        self.hotspots.iter().find(|h| h.id == id)
    }

    pub fn len(&self) -> usize {
        self.hotspots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hotspots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Hotspot> {
        self.hotspots.iter()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
