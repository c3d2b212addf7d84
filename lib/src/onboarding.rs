use crate::error::Result;
use crate::store::LocalStore;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OnboardingStep {
    pub title: &'static str,
    pub description: &'static str,
    pub image: Option<&'static str>,
}

pub const STEPS: [OnboardingStep; 4] = [
    OnboardingStep {
        title: "Welcome to the Course",
        description: "This interactive course will guide you through building real Web3 applications step by step.",
        image: Some("/static/images/interface.png"),
    },
    OnboardingStep {
        title: "Course Structure",
        description: "Each course is divided into lessons, and each lesson contains multiple chapters. Complete them in sequence to build your project.",
        image: None,
    },
    OnboardingStep {
        title: "Interactive Editor",
        description: "Use the code editor to write and test your code. We'll check your solutions and provide hints when needed.",
        image: None,
    },
    OnboardingStep {
        title: "Feedback & Help",
        description: "Submit feedback directly through GitHub issues if you encounter problems or have suggestions for improvements.",
        image: None,
    },
];

pub fn seen_key(course_title: &str) -> String {
    format!("onboarding-{course_title}")
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Advance {
    Step(usize),
    Finished,
}

/// One-time walkthrough shown the first time a course is opened.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Onboarding {
    course_title: String,
    current_step: usize,
    open: bool,
}

impl Onboarding {
    /// Opens the walkthrough unless it was already seen for this course.
    pub fn start<S: LocalStore + ?Sized>(store: &S, course_title: impl Into<String>) -> Result<Self> {
        let course_title = course_title.into();
        let seen = store.get(&seen_key(&course_title))?.is_some();

        Ok(Self {
            course_title,
            current_step: 0,
            open: !seen,
        })
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn step(&self) -> &'static OnboardingStep {
        &STEPS[self.current_step]
    }

    /// Percentage shown on the progress bar, counting the current step.
    pub fn progress(&self) -> f64 {
        (self.current_step + 1) as f64 / STEPS.len() as f64 * 100.0
    }

    pub fn next<S: LocalStore + ?Sized>(&mut self, store: &mut S) -> Result<Advance> {
        if self.current_step < STEPS.len() - 1 {
            self.current_step += 1;
            return Ok(Advance::Step(self.current_step));
        }

        self.finish(store)?;

        Ok(Advance::Finished)
    }

    pub fn skip<S: LocalStore + ?Sized>(&mut self, store: &mut S) -> Result<()> {
        self.finish(store)
    }

    fn finish<S: LocalStore + ?Sized>(&mut self, store: &mut S) -> Result<()> {
        store.set(&seen_key(&self.course_title), "true".to_owned())?;
        self.open = false;

        Ok(())
    }
}
