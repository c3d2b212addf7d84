use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub type ChapterProgress = BTreeMap<String, bool>;
pub type LessonProgress = BTreeMap<String, ChapterProgress>;

/// `courseId -> lessonId -> chapterId -> completed`.
///
/// Chapters are only ever inserted as `true`; an absent chapter has not been
/// completed yet.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct CompletionMap(BTreeMap<String, LessonProgress>);

/// Identity of a chapter; also the shape of a queued pending update.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct ChapterRef {
    pub course_id: String,
    pub lesson_id: String,
    pub chapter_id: String,
}

impl ChapterRef {
    pub fn new(
        course_id: impl Into<String>,
        lesson_id: impl Into<String>,
        chapter_id: impl Into<String>,
    ) -> Self {
        Self {
            course_id: course_id.into(),
            lesson_id: lesson_id.into(),
            chapter_id: chapter_id.into(),
        }
    }
}

impl CompletionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a stored copy; anything unparsable reads as an empty map.
    pub fn from_stored(raw: Option<&str>) -> Self {
        raw.and_then(|raw| serde_json::from_str(raw).ok())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn course(&self, course_id: &str) -> Option<&LessonProgress> {
        self.0.get(course_id)
    }

    pub fn lesson(&self, course_id: &str, lesson_id: &str) -> Option<&ChapterProgress> {
        self.course(course_id)?.get(lesson_id)
    }

    pub fn is_completed(&self, chapter: &ChapterRef) -> bool {
        self.lesson(&chapter.course_id, &chapter.lesson_id)
            .and_then(|chapters| chapters.get(&chapter.chapter_id))
            .copied()
            .unwrap_or(false)
    }

    pub fn mark_completed(&mut self, chapter: &ChapterRef) {
        self.set(chapter, true);
    }

    pub fn set(&mut self, chapter: &ChapterRef, completed: bool) {
        self.0
            .entry(chapter.course_id.clone())
            .or_default()
            .entry(chapter.lesson_id.clone())
            .or_default()
            .insert(chapter.chapter_id.clone(), completed);
    }

    /// Every leaf as `(chapter, value)`, in key order.
    pub fn chapters(&self) -> impl Iterator<Item = (ChapterRef, bool)> + '_ {
        self.0.iter().flat_map(|(course_id, lessons)| {
            lessons.iter().flat_map(move |(lesson_id, chapters)| {
                chapters.iter().map(move |(chapter_id, completed)| {
                    (ChapterRef::new(course_id, lesson_id, chapter_id), *completed)
                })
            })
        })
    }

    /// Flattens leaves into `progress.<course>.<lesson>.<chapter>` keys, the
    /// shape of a partial document update.
    pub fn flatten(&self) -> BTreeMap<String, bool> {
        self.chapters()
            .map(|(chapter, completed)| {
                (
                    format!(
                        "progress.{}.{}.{}",
                        chapter.course_id, chapter.lesson_id, chapter.chapter_id
                    ),
                    completed,
                )
            })
            .collect()
    }

    /// Applies flattened `progress.<course>.<lesson>.<chapter>` keys, as
    /// produced by `flatten`. Returns whether any value changed. Keys that do
    /// not have that shape are skipped.
    pub fn apply_set(&mut self, set: &BTreeMap<String, bool>) -> bool {
        let mut changed = false;

        for (path, completed) in set {
            let Some(chapter) = parse_path(path) else {
                continue;
            };

            let previous = self
                .lesson(&chapter.course_id, &chapter.lesson_id)
                .and_then(|chapters| chapters.get(&chapter.chapter_id))
                .copied();

            if previous != Some(*completed) {
                self.set(&chapter, *completed);
                changed = true;
            }
        }

        changed
    }

    /// Completion percentage, rounded to the nearest integer.
    ///
    /// Without a lesson, every recorded chapter of the course is the
    /// denominator. With a lesson, `total_chapters` is the denominator, so
    /// callers must supply the real chapter count.
    pub fn completion(
        &self,
        course_id: &str,
        lesson_id: Option<&str>,
        total_chapters: Option<usize>,
    ) -> u32 {
        if self.is_empty() {
            return 0;
        }

        match lesson_id {
            None => {
                let Some(lessons) = self.course(course_id) else {
                    return 0;
                };

                let (completed, total) = lessons
                    .values()
                    .flat_map(|chapters| chapters.values())
                    .fold((0, 0), |(completed, total), done| {
                        (completed + usize::from(*done), total + 1)
                    });

                percentage(completed, total)
            }
            Some(lesson_id) => {
                let completed = self
                    .lesson(course_id, lesson_id)
                    .map(|chapters| chapters.values().filter(|done| **done).count())
                    .unwrap_or(0);

                percentage(completed, total_chapters.unwrap_or(0))
            }
        }
    }
}

fn parse_path(path: &str) -> Option<ChapterRef> {
    let mut parts = path.strip_prefix("progress.")?.splitn(3, '.');

    Some(ChapterRef::new(parts.next()?, parts.next()?, parts.next()?))
}

fn percentage(completed: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }

    (completed as f64 / total as f64 * 100.0).round() as u32
}
