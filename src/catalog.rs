use include_dir::{include_dir, Dir};
use itertools::Itertools;
use rand::seq::SliceRandom;
use serde::Deserialize;
use serde_json::from_str;
use std::collections::HashSet;
use std::error::Error;

static FRAGEN_DIR: Dir = include_dir!("src/fragen");

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct AnswerOption {
    pub id: String,
    pub label: String,
}

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Question {
    /// Device the question is about, shown in the view header.
    pub subject: String,
    pub text: String,
    pub options: Vec<AnswerOption>,
    pub correct: Vec<String>,
}

impl Question {
    pub fn correct_ids(&self) -> HashSet<String> {
        self.correct.iter().cloned().collect()
    }

    pub fn option_ids(&self) -> HashSet<String> {
        self.options.iter().map(|o| o.id.clone()).collect()
    }

    pub fn has_option(&self, id: &str) -> bool {
        self.options.iter().any(|o| o.id == id)
    }

    /// Option ids that occur more than once, if any.
    pub fn duplicate_option_ids(&self) -> Vec<String> {
        self.options
            .iter()
            .map(|o| o.id.clone())
            .duplicates()
            .collect()
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct Catalog {
    pub name: String,
    pub questions: Vec<Question>,
}

impl Catalog {
    /// The catalog shipped with the binary.
    pub fn builtin() -> Self {
        read_catalog_from_file("geraete.json").unwrap()
    }

    /// Draw up to `n` distinct questions in random order. Returns fewer if
    /// the catalog is smaller; the session setup rejects that case.
    pub fn draw(&self, n: usize) -> Vec<Question> {
        let mut rng = rand::thread_rng();
        self.questions
            .choose_multiple(&mut rng, n)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

fn read_catalog_from_file(file_name: &str) -> Result<Catalog, Box<dyn Error>> {
    let file = FRAGEN_DIR
        .get_file(file_name)
        .expect("Catalog file not found");

    let file_as_str = file
        .contents_utf8()
        .expect("Unable to interpret file as a string");

    let catalog = from_str(file_as_str).expect("Unable to deserialize catalog json");

    Ok(catalog)
}
