use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Achievement levels used on report cards, highest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LetterGrade {
    AD,
    A,
    B,
    C,
}

impl LetterGrade {
    pub fn score(self) -> u32 {
        match self {
            LetterGrade::AD => 4,
            LetterGrade::A => 3,
            LetterGrade::B => 2,
            LetterGrade::C => 1,
        }
    }

    pub fn from_mean(mean: f64) -> Self {
        if mean >= 3.5 {
            LetterGrade::AD
        } else if mean >= 2.5 {
            LetterGrade::A
        } else if mean >= 1.5 {
            LetterGrade::B
        } else {
            LetterGrade::C
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LetterGrade::AD => "AD",
            LetterGrade::A => "A",
            LetterGrade::B => "B",
            LetterGrade::C => "C",
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            LetterGrade::AD => "grade-ad",
            LetterGrade::A => "grade-a",
            LetterGrade::B => "grade-b",
            LetterGrade::C => "grade-c",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            LetterGrade::AD => "Outstanding achievement",
            LetterGrade::A => "Expected achievement",
            LetterGrade::B => "In progress",
            LetterGrade::C => "Beginning",
        }
    }
}

impl FromStr for LetterGrade {
    type Err = ();

    // Exact match only; anything else is not gradable.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AD" => Ok(LetterGrade::AD),
            "A" => Ok(LetterGrade::A),
            "B" => Ok(LetterGrade::B),
            "C" => Ok(LetterGrade::C),
            _ => Err(()),
        }
    }
}

impl fmt::Display for LetterGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeAverage {
    pub mean: f64,
    pub letter: LetterGrade,
    pub graded_count: usize,
    pub ignored_count: usize,
}

/// Mean score over the gradable values, mapped back to a letter.
/// `None` when nothing in `values` is a letter grade.
pub fn average<'a, I>(values: I) -> Option<GradeAverage>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut sum: u32 = 0;
    let mut graded_count: usize = 0;
    let mut ignored_count: usize = 0;

    for v in values {
        match v.parse::<LetterGrade>() {
            Ok(g) => {
                sum += g.score();
                graded_count += 1;
            }
            Err(()) => ignored_count += 1,
        }
    }

    if graded_count == 0 {
        return None;
    }
    let mean = f64::from(sum) / graded_count as f64;
    Some(GradeAverage {
        mean,
        letter: LetterGrade::from_mean(mean),
        graded_count,
        ignored_count,
    })
}

pub fn average_letter<'a, I>(values: I) -> Option<LetterGrade>
where
    I: IntoIterator<Item = &'a str>,
{
    average(values).map(|a| a.letter)
}
