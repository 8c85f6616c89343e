use crate::error::ErrorKind;
use crate::hash::ContentHash;

use super::{Points, Question, TextRegion};

/// One element between `GROUP` and `END_GROUP`, in source order.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupMember {
    Question(Question),
    Text(TextRegion),
}

/// A pool of interchangeable questions, of which `pick` are shown.
///
/// Text regions may sit among the questions; they do not count towards the
/// population and do not affect the group's identity.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub id: String,
    pub hash: ContentHash,
    pub members: Vec<GroupMember>,
    pub pick: usize,
    /// How many questions the solutions export shows; at least `pick`.
    pub solutions_pick: usize,
    pub points_per_question: Points,
}

fn questions_of(members: &[GroupMember]) -> impl Iterator<Item = &Question> {
    members.iter().filter_map(|m| match m {
        GroupMember::Question(q) => Some(q),
        GroupMember::Text(_) => None,
    })
}

impl Group {
    pub fn questions(&self) -> impl Iterator<Item = &Question> {
        questions_of(&self.members)
    }

    /// Number of questions the group draws from.
    pub fn population(&self) -> usize {
        self.questions().count()
    }

    /// Points this group contributes to the quiz total.
    pub fn points_possible(&self) -> Points {
        self.points_per_question * self.pick
    }
}

/// Collects group options and members between `GROUP` and `END_GROUP`.
#[derive(Debug, Default)]
pub(crate) struct GroupBuilder {
    pick: Option<usize>,
    solutions_pick: Option<usize>,
    points_per_question: Option<Points>,
    members: Vec<GroupMember>,
}

fn parse_count(label: &str, text: &str) -> Result<usize, ErrorKind> {
    match text.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ErrorKind::syntax(format!(
            "\"{label}\" value is invalid (must be positive integer): \"{text}\""
        ))),
    }
}

impl GroupBuilder {
    pub(crate) fn has_members(&self) -> bool {
        !self.members.is_empty()
    }

    fn questions(&self) -> impl Iterator<Item = &Question> {
        questions_of(&self.members)
    }

    pub(crate) fn set_pick(&mut self, text: &str) -> Result<(), ErrorKind> {
        if self.pick.is_some() {
            return Err(ErrorKind::semantic(
                "\"Pick\" has already been set for this question group",
            ));
        }
        self.pick = Some(parse_count("Pick", text)?);
        Ok(())
    }

    pub(crate) fn set_solutions_pick(&mut self, text: &str) -> Result<(), ErrorKind> {
        if self.solutions_pick.is_some() {
            return Err(ErrorKind::semantic(
                "\"Solutions pick\" has already been set for this question group",
            ));
        }
        self.solutions_pick = Some(parse_count("Solutions pick", text)?);
        Ok(())
    }

    pub(crate) fn set_points_per_question(&mut self, text: &str) -> Result<(), ErrorKind> {
        if self.points_per_question.is_some() {
            return Err(ErrorKind::semantic(
                "\"Points per question\" has already been set for this question group",
            ));
        }
        self.points_per_question = Some(Points::parse(text)?);
        Ok(())
    }

    pub(crate) fn push(&mut self, question: Question) -> Result<(), ErrorKind> {
        if let Some(first) = self.questions().next()
            && first.points != question.points
        {
            return Err(ErrorKind::semantic(
                "Question groups must only contain questions with the same point value",
            ));
        }
        self.members.push(GroupMember::Question(question));
        Ok(())
    }

    pub(crate) fn push_text(&mut self, region: TextRegion) {
        self.members.push(GroupMember::Text(region));
    }

    /// Applies defaults and checks `population >= solutions_pick >= pick >= 1`.
    pub(crate) fn finish(self) -> Result<Group, ErrorKind> {
        let pick = self.pick.unwrap_or(1);
        let solutions_pick = self.solutions_pick.unwrap_or(pick);
        let population = self.questions().count();

        if population < pick {
            return Err(ErrorKind::semantic(format!(
                "Question group only contains {population} questions, needs at least {pick}"
            )));
        }
        if solutions_pick < pick {
            return Err(ErrorKind::semantic(format!(
                "\"Solutions pick\" ({solutions_pick}) must be at least \"Pick\" ({pick})"
            )));
        }
        if population < solutions_pick {
            return Err(ErrorKind::semantic(format!(
                "Question group only contains {population} questions, \"Solutions pick\" needs {solutions_pick}"
            )));
        }

        let points_per_question = self
            .points_per_question
            .or_else(|| self.questions().next().map(|q| q.points))
            .unwrap_or(Points::ONE);
        let hash = ContentHash::of_sorted(self.questions().map(|q| q.hash));

        Ok(Group {
            id: hash.to_hex(),
            hash,
            members: self.members,
            pick,
            solutions_pick,
            points_per_question,
        })
    }
}
