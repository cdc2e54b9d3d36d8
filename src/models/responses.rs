use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One question with the patient's free-text answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionAnswer {
    pub question: String,
    pub answer: String,
}

/// Ordered question → answer mapping collected by the conversation front end.
///
/// Questions are unique: inserting an existing question replaces its answer
/// in place, keeping the original position. Order only matters for
/// reporting and prompt layout, never for classification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseSet {
    entries: Vec<QuestionAnswer>,
}

impl ResponseSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        let question = question.into();
        let answer = answer.into();
        match self.entries.iter_mut().find(|e| e.question == question) {
            Some(existing) => existing.answer = answer,
            None => self.entries.push(QuestionAnswer { question, answer }),
        }
    }

    pub fn with(mut self, question: impl Into<String>, answer: impl Into<String>) -> Self {
        self.insert(question, answer);
        self
    }

    pub fn get(&self, question: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.question == question)
            .map(|e| e.answer.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &QuestionAnswer> {
        self.entries.iter()
    }

    pub fn answers(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.answer.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<Q: Into<String>, A: Into<String>> FromIterator<(Q, A)> for ResponseSet {
    fn from_iter<I: IntoIterator<Item = (Q, A)>>(iter: I) -> Self {
        let mut set = ResponseSet::new();
        for (q, a) in iter {
            set.insert(q, a);
        }
        set
    }
}

impl Serialize for ResponseSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.question, &entry.answer)?;
        }
        map.end()
    }
}

struct ResponseSetVisitor;

impl<'de> Visitor<'de> for ResponseSetVisitor {
    type Value = ResponseSet;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of question text to answer text")
    }

    fn visit_map<M: MapAccess<'de>>(self, mut access: M) -> Result<Self::Value, M::Error> {
        let mut set = ResponseSet::new();
        while let Some((question, answer)) = access.next_entry::<String, String>()? {
            set.insert(question, answer);
        }
        Ok(set)
    }
}

impl<'de> Deserialize<'de> for ResponseSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(ResponseSetVisitor)
    }
}
