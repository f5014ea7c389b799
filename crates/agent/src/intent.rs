use chrono::{Datelike, Duration, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::context::ConversationContext;

/// Capability every unmatched input falls back to.
pub const FALLBACK_CAPABILITY: &str = "conversation";

/// The router's interpretation of one free-text request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intent {
    pub capability: String,
    pub params: Value,
    pub confidence: f64,
}

impl Intent {
    pub fn fallback(text: &str) -> Self {
        Self {
            capability: FALLBACK_CAPABILITY.to_string(),
            params: json!({"text": text}),
            confidence: 0.0,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.capability == FALLBACK_CAPABILITY && self.confidence == 0.0
    }
}

struct RouteRule {
    capability: &'static str,
    triggers: Vec<&'static str>,
    patterns: Vec<Regex>,
    priority: u8,
    extract: fn(&str) -> Value,
}

/// Maps free text to a capability plus extracted parameters using an ordered,
/// declarative rule table.
///
/// Selection policy: highest rule priority wins; ties go to the most specific
/// (longest) matched trigger or pattern; remaining ties to the
/// earliest-declared rule. Unmatched input always resolves to the
/// conversational fallback with confidence 0; routing never fails.
pub struct IntentRouter {
    rules: Vec<RouteRule>,
}

impl Default for IntentRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentRouter {
    pub fn new() -> Self {
        let rules = vec![
            // ── Calendar listings (more specific than the create phrasings) ──
            RouteRule {
                capability: "calendar",
                triggers: vec![
                    "show my events",
                    "list my events",
                    "list events",
                    "show events",
                    "upcoming events",
                    "my calendar",
                ],
                patterns: vec![],
                priority: 6,
                extract: |_| json!({"action": "list_events"}),
            },
            RouteRule {
                capability: "calendar",
                triggers: vec!["show my reminders", "list reminders", "show reminders"],
                patterns: vec![],
                priority: 6,
                extract: |_| json!({"action": "list_reminders"}),
            },
            // ── Weather ──
            RouteRule {
                capability: "weather",
                triggers: vec!["weather", "forecast", "temperature"],
                patterns: vec![],
                priority: 5,
                extract: extract_weather,
            },
            // ── Reminders ──
            RouteRule {
                capability: "calendar",
                triggers: vec!["remind me", "reminder", "remember to"],
                patterns: vec![],
                priority: 5,
                extract: extract_reminder,
            },
            // ── Event scheduling ──
            RouteRule {
                capability: "calendar",
                triggers: vec!["schedule", "create event", "add event", "appointment", "meeting"],
                patterns: vec![],
                priority: 5,
                extract: extract_schedule,
            },
            // ── Email ──
            RouteRule {
                capability: "email",
                triggers: vec!["send email", "compose email", "email"],
                patterns: vec![Regex::new(r"[\w.+-]+@[\w-]+\.[\w.-]+").unwrap()],
                priority: 5,
                extract: extract_email,
            },
            // ── Social ──
            RouteRule {
                capability: "social",
                triggers: vec!["trending topics", "news summary", "x trends", "trending", "trends"],
                patterns: vec![],
                priority: 5,
                extract: |_| json!({"action": "trends"}),
            },
            RouteRule {
                capability: "social",
                triggers: vec!["post to x", "post on x", "tweet"],
                patterns: vec![],
                priority: 5,
                extract: extract_post,
            },
        ];
        Self { rules }
    }

    /// Resolve text to an [`Intent`]. Never fails; unmatched input yields the
    /// fallback intent, optionally biased by the conversation context.
    pub fn route(&self, text: &str, ctx: &ConversationContext) -> Intent {
        let lower = text.to_lowercase();

        // (rule index, priority, specificity = longest matched trigger/pattern)
        let mut best: Option<(usize, u8, usize)> = None;
        for (idx, rule) in self.rules.iter().enumerate() {
            let mut specificity: Option<usize> = None;
            for trigger in &rule.triggers {
                if lower.contains(trigger) {
                    specificity = Some(specificity.map_or(trigger.len(), |s| s.max(trigger.len())));
                }
            }
            for pattern in &rule.patterns {
                if let Some(m) = pattern.find(text) {
                    let len = m.as_str().len();
                    specificity = Some(specificity.map_or(len, |s| s.max(len)));
                }
            }
            if let Some(len) = specificity {
                let wins = match best {
                    None => true,
                    Some((_, p, s)) => rule.priority > p || (rule.priority == p && len > s),
                };
                if wins {
                    best = Some((idx, rule.priority, len));
                }
            }
        }

        match best {
            Some((idx, _, specificity)) => {
                let rule = &self.rules[idx];
                // specificity feeds confidence: longer matches read as more
                // certain, capped below 1.0
                let confidence = (0.5 + 0.4 * (specificity as f64 / 20.0)).min(0.9);
                let intent = Intent {
                    capability: rule.capability.to_string(),
                    params: (rule.extract)(text),
                    confidence,
                };
                debug!(capability = %intent.capability, confidence = intent.confidence, "Routed intent");
                intent
            }
            None => self.route_follow_up(text, &lower, ctx),
        }
    }

    /// A short follow-up ("what about tomorrow?") with a routable prior
    /// intent in context re-targets that capability at reduced confidence.
    fn route_follow_up(&self, text: &str, lower: &str, ctx: &ConversationContext) -> Intent {
        const LEADS: [&str; 3] = ["what about", "how about", "and "];
        let is_follow_up = LEADS.iter().any(|lead| lower.starts_with(lead));
        if is_follow_up {
            if let Some(prior) = ctx.last_routed_intent() {
                let mut params = prior.params.clone();
                if let Some(obj) = params.as_object_mut() {
                    obj.insert("text".to_string(), Value::String(text.to_string()));
                }
                debug!(capability = %prior.capability, "Follow-up re-routed to prior capability");
                return Intent {
                    capability: prior.capability.clone(),
                    params,
                    confidence: 0.4,
                };
            }
        }
        Intent::fallback(text)
    }
}

fn titlecase_word(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// City name from phrases like "weather in New York" or a capitalized word.
pub fn extract_city(text: &str) -> Option<String> {
    const STOP_WORDS: [&str; 6] = ["today", "tomorrow", "tonight", "now", "please", "this"];
    let words: Vec<&str> = text.split_whitespace().collect();

    for (i, word) in words.iter().enumerate() {
        let w = word.to_lowercase();
        if (w == "in" || w == "for" || w == "at") && i + 1 < words.len() {
            let mut parts = Vec::new();
            for candidate in &words[i + 1..] {
                let cleaned: String = candidate
                    .chars()
                    .filter(|c| c.is_alphanumeric() || *c == '-')
                    .collect();
                if cleaned.is_empty() || STOP_WORDS.contains(&cleaned.to_lowercase().as_str()) {
                    break;
                }
                parts.push(titlecase_word(&cleaned));
                if parts.len() == 3 {
                    break;
                }
            }
            if !parts.is_empty() {
                return Some(parts.join(" "));
            }
        }
    }

    // fallback: first capitalized word past the sentence start
    words
        .iter()
        .skip(1)
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .find(|w| w.len() > 2 && w.chars().next().is_some_and(|c| c.is_uppercase()))
        .map(|w| w.to_string())
}

fn extract_weather(text: &str) -> Value {
    match extract_city(text) {
        Some(city) => json!({"city": city}),
        None => json!({}),
    }
}

/// Lightweight date/time phrase parsing: RFC 3339, or
/// "today|tomorrow [at H[:MM] [am|pm]]". Anything else lands on tomorrow
/// morning, the assistant's standing default.
pub fn parse_time_phrase(phrase: &str) -> chrono::DateTime<Utc> {
    static DAY_TIME: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)\b(today|tomorrow)(?:\s+at\s+(\d{1,2})(?::(\d{2}))?\s*(am|pm)?)?").unwrap()
    });

    let trimmed = phrase.trim().trim_end_matches(['.', '!', '?']);

    if let Ok(instant) = chrono::DateTime::parse_from_rfc3339(trimmed) {
        return instant.with_timezone(&Utc);
    }

    let now = Utc::now();
    if let Some(caps) = DAY_TIME.captures(trimmed) {
        let day_offset = if caps[1].to_lowercase() == "today" { 0 } else { 1 };
        let mut hour: u32 = caps
            .get(2)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(9);
        let minute: u32 = caps
            .get(3)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0);
        if let Some(meridiem) = caps.get(4) {
            if meridiem.as_str().eq_ignore_ascii_case("pm") && hour < 12 {
                hour += 12;
            }
            if meridiem.as_str().eq_ignore_ascii_case("am") && hour == 12 {
                hour = 0;
            }
        }
        let date = now.date_naive() + Duration::days(day_offset);
        if let Some(instant) = Utc
            .with_ymd_and_hms(date.year(), date.month(), date.day(), hour % 24, minute % 60, 0)
            .single()
        {
            return instant;
        }
    }

    // default: tomorrow at 09:00
    let tomorrow = (now + Duration::days(1)).date_naive();
    Utc.with_ymd_and_hms(tomorrow.year(), tomorrow.month(), tomorrow.day(), 9, 0, 0)
        .single()
        .unwrap_or(now + Duration::days(1))
}

fn extract_schedule(text: &str) -> Value {
    static TIMED: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)(?:schedule|create event:?|add event:?)\s+(?:an?\s+)?(.+?)\s+(?:at|on|for)\s+(.+)$").unwrap()
    });
    static BARE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?i)(?:schedule|create event:?|add event:?)\s+(.+)$").unwrap());

    if let Some(caps) = TIMED.captures(text) {
        return json!({
            "action": "create_event",
            "title": titlecase_word(caps[1].trim()),
            "start": parse_time_phrase(&caps[2]).to_rfc3339(),
        });
    }

    if let Some(caps) = BARE.captures(text) {
        return json!({
            "action": "create_event",
            "title": titlecase_word(caps[1].trim()),
            "start": parse_time_phrase("tomorrow").to_rfc3339(),
        });
    }

    json!({
        "action": "create_event",
        "title": "Meeting",
        "start": parse_time_phrase("tomorrow").to_rfc3339(),
    })
}

fn extract_reminder(text: &str) -> Value {
    static TIMED: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?i)remind me to\s+(.+?)\s+(?:at|on)\s+(.+)$").unwrap());
    static BARE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)(?:remind me to|remember to|remind me|reminder to|reminder:?)\s+(.+)$")
            .unwrap()
    });

    if let Some(caps) = TIMED.captures(text) {
        return json!({
            "action": "create_reminder",
            "text": caps[1].trim(),
            "start": parse_time_phrase(&caps[2]).to_rfc3339(),
        });
    }

    if let Some(caps) = BARE.captures(text) {
        return json!({"action": "create_reminder", "text": caps[1].trim()});
    }

    json!({"action": "create_reminder", "text": text.trim()})
}

fn extract_email(text: &str) -> Value {
    static ADDRESS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\w.+-]+@[\w-]+\.[\w.-]+").unwrap());
    static ABOUT: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?i)\babout\s+(.+?)(?:\s+and message\s+.*)?$").unwrap());
    static WITH_SUBJECT: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?i)\bwith subject\s+(.+?)(?:\s+and message\s+.*)?$").unwrap());
    static BODY: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?i)\b(?:and\s+)?message\s+(.+)$").unwrap());

    let mut params = serde_json::Map::new();

    if let Some(m) = ADDRESS.find(text) {
        params.insert("to".to_string(), Value::String(m.as_str().to_string()));
    }

    if let Some(caps) = ABOUT.captures(text) {
        params.insert("subject".to_string(), Value::String(caps[1].trim().to_string()));
    } else if let Some(caps) = WITH_SUBJECT.captures(text) {
        params.insert("subject".to_string(), Value::String(caps[1].trim().to_string()));
    }

    if let Some(caps) = BODY.captures(text) {
        params.insert("body".to_string(), Value::String(caps[1].trim().to_string()));
    }

    Value::Object(params)
}

fn extract_post(text: &str) -> Value {
    static EXPLICIT: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?i)(?:post to x|post on x|tweet):?\s+(.+)$").unwrap());
    let body = EXPLICIT
        .captures(text)
        .map(|caps| caps[1].trim().to_string())
        .unwrap_or_else(|| text.trim().to_string());
    json!({"action": "post", "text": body})
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router() -> IntentRouter {
        IntentRouter::new()
    }

    fn ctx() -> ConversationContext {
        ConversationContext::new(10)
    }

    #[test]
    fn test_unmatched_input_falls_back_with_zero_confidence() {
        let intent = router().route("tell me a joke about ducks", &ctx());
        assert_eq!(intent.capability, FALLBACK_CAPABILITY);
        assert_eq!(intent.confidence, 0.0);
        assert!(intent.is_fallback());
    }

    #[test]
    fn test_weather_routing_extracts_city() {
        let intent = router().route("What's the weather in New York?", &ctx());
        assert_eq!(intent.capability, "weather");
        assert_eq!(intent.params["city"], "New York");
        assert!(intent.confidence > 0.0 && intent.confidence <= 1.0);
    }

    #[test]
    fn test_city_fallback_capitalized_word() {
        assert_eq!(extract_city("Check Tokyo weather"), Some("Tokyo".to_string()));
        assert_eq!(extract_city("weather in paris tomorrow"), Some("Paris".to_string()));
        assert_eq!(extract_city("how is the weather"), None);
    }

    #[test]
    fn test_longest_trigger_wins_tie() {
        // "remind me" (9 chars) beats "weather" (7 chars) at equal priority
        let intent = router().route("remind me to check the weather", &ctx());
        assert_eq!(intent.capability, "calendar");
        assert_eq!(intent.params["action"], "create_reminder");
        assert_eq!(intent.params["text"], "check the weather");
    }

    #[test]
    fn test_priority_beats_length() {
        // list rule at priority 6 wins over the reminder-create rule even
        // though "show my reminders" also contains "reminder"
        let intent = router().route("show my reminders", &ctx());
        assert_eq!(intent.params["action"], "list_reminders");
    }

    #[test]
    fn test_email_extraction() {
        let intent = router().route(
            "Send email to john@example.com about meeting tomorrow",
            &ctx(),
        );
        assert_eq!(intent.capability, "email");
        assert_eq!(intent.params["to"], "john@example.com");
        assert_eq!(intent.params["subject"], "meeting tomorrow");
    }

    #[test]
    fn test_schedule_extraction_with_time() {
        let intent = router().route("Schedule team picnic at tomorrow at 2 pm", &ctx());
        assert_eq!(intent.capability, "calendar");
        assert_eq!(intent.params["action"], "create_event");
        assert_eq!(intent.params["title"], "Team picnic");
        let start = chrono::DateTime::parse_from_rfc3339(intent.params["start"].as_str().unwrap())
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(start.time().to_string(), "14:00:00");
    }

    #[test]
    fn test_time_phrase_parsing() {
        let rfc = parse_time_phrase("2025-06-10T14:00:00Z");
        assert_eq!(rfc.to_rfc3339(), "2025-06-10T14:00:00+00:00");

        let morning = parse_time_phrase("tomorrow");
        assert_eq!(morning.time().to_string(), "09:00:00");

        let noon = parse_time_phrase("tomorrow at 12 pm");
        assert_eq!(noon.time().to_string(), "12:00:00");
    }

    #[test]
    fn test_social_routes() {
        let trends = router().route("show me trending topics", &ctx());
        assert_eq!(trends.capability, "social");
        assert_eq!(trends.params["action"], "trends");

        let post = router().route("post to x: good morning world", &ctx());
        assert_eq!(post.capability, "social");
        assert_eq!(post.params["text"], "good morning world");
    }

    #[test]
    fn test_follow_up_uses_prior_intent() {
        let router = router();
        let mut ctx = ctx();
        let first = router.route("weather in Oslo", &ctx);
        ctx.record_intent(first);

        let follow = router.route("what about tomorrow?", &ctx);
        assert_eq!(follow.capability, "weather");
        assert_eq!(follow.params["city"], "Oslo");
        assert!((follow.confidence - 0.4).abs() < f64::EPSILON);
    }

    #[test]
    fn test_follow_up_without_context_is_fallback() {
        let intent = router().route("what about tomorrow?", &ctx());
        assert!(intent.is_fallback());
    }
}
