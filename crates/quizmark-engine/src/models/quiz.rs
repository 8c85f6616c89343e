use crate::hash::ContentHash;
use crate::render::Resource;

use super::{Group, GroupMember, Points, Question, RichText, TextRegion};

/// Presentation options, each settable at most once before the first question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizOptions {
    pub shuffle_answers: bool,
    pub show_correct_answers: bool,
    pub one_question_at_a_time: bool,
    pub cant_go_back: bool,
    /// `None` means unlimited attempts.
    pub allowed_attempts: Option<u32>,
}

impl Default for QuizOptions {
    fn default() -> Self {
        Self {
            shuffle_answers: false,
            show_correct_answers: true,
            one_question_at_a_time: false,
            cant_go_back: false,
            allowed_attempts: Some(1),
        }
    }
}

/// A top-level element of the quiz, in source order.
#[derive(Debug, Clone, PartialEq)]
pub enum QuizItem {
    Question(Question),
    Group(Group),
    Text(TextRegion),
}

/// Flat view of a quiz, with group membership expressed as start/end delimiters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QuizEntry<'a> {
    Question(&'a Question),
    GroupStart(&'a Group),
    GroupEnd(&'a Group),
    Text(&'a TextRegion),
}

/// A finalized, validated quiz.
#[derive(Debug, Clone, PartialEq)]
pub struct Quiz {
    pub id: String,
    pub hash: ContentHash,
    pub title_raw: Option<String>,
    /// Escaped title, `Quiz` when none was given.
    pub title: String,
    pub description: Option<RichText>,
    pub options: QuizOptions,
    pub items: Vec<QuizItem>,
    pub points_possible: Points,
    /// External files referenced by rendered content.
    pub resources: Vec<Resource>,
}

impl Quiz {
    pub(crate) fn assemble(
        title_raw: Option<String>,
        title: String,
        description: Option<RichText>,
        options: QuizOptions,
        items: Vec<QuizItem>,
        resources: Vec<Resource>,
    ) -> Self {
        let points_possible = items
            .iter()
            .map(|item| match item {
                QuizItem::Question(q) => q.points,
                QuizItem::Group(g) => g.points_possible(),
                QuizItem::Text(_) => Points::ZERO,
            })
            .sum();
        let hash = ContentHash::of_sorted(items.iter().filter_map(|item| match item {
            QuizItem::Question(q) => Some(q.hash),
            QuizItem::Group(g) => Some(g.hash),
            QuizItem::Text(_) => None,
        }));
        Self {
            id: hash.to_hex(),
            hash,
            title_raw,
            title,
            description,
            options,
            items,
            points_possible,
            resources,
        }
    }

    /// Walks the quiz as a flat sequence of questions, group delimiters and
    /// text regions.
    pub fn entries(&self) -> impl Iterator<Item = QuizEntry<'_>> {
        let mut entries = Vec::with_capacity(self.items.len());
        for item in &self.items {
            match item {
                QuizItem::Question(q) => entries.push(QuizEntry::Question(q)),
                QuizItem::Text(t) => entries.push(QuizEntry::Text(t)),
                QuizItem::Group(g) => {
                    entries.push(QuizEntry::GroupStart(g));
                    entries.extend(g.members.iter().map(|m| match m {
                        GroupMember::Question(q) => QuizEntry::Question(q),
                        GroupMember::Text(t) => QuizEntry::Text(t),
                    }));
                    entries.push(QuizEntry::GroupEnd(g));
                }
            }
        }
        entries.into_iter()
    }

    /// Every question, standalone or group member, in source order.
    pub fn questions(&self) -> impl Iterator<Item = &Question> {
        self.entries().filter_map(|e| match e {
            QuizEntry::Question(q) => Some(q),
            _ => None,
        })
    }
}
