//! Topic catalog: the built-in list plus lookup by id.

use crate::domain::Topic;

/// Immutable set of topics offered in the sidebar.
#[derive(Clone, Debug)]
pub struct Catalog {
  topics: Vec<Topic>,
}

impl Catalog {
  pub fn new(topics: Vec<Topic>) -> Self {
    Self { topics }
  }

  pub fn topics(&self) -> &[Topic] {
    &self.topics
  }

  pub fn get(&self, id: &str) -> Option<&Topic> {
    self.topics.iter().find(|t| t.id == id)
  }
}

impl Default for Catalog {
  fn default() -> Self {
    Self::new(builtin_topics())
  }
}

fn topic(id: &str, name: &str, icon: &str, description: &str) -> Topic {
  Topic {
    id: id.into(),
    name: name.into(),
    icon: icon.into(),
    description: description.into(),
  }
}

/// Data-science topics available when no config file overrides them.
pub fn builtin_topics() -> Vec<Topic> {
  vec![
    topic("python-basics", "Python Basics", "terminal", "Lists, Dicts, and Loops"),
    topic("numpy-arrays", "NumPy Arrays", "database", "Array manipulation & math"),
    topic("pandas-basics", "Pandas DataFrames", "chart", "Filtering & Selecting Data"),
    topic("pandas-advanced", "Advanced Pandas", "activity", "Groupby, Merge & Pivot"),
    topic("sklearn-intro", "Scikit-Learn Intro", "brain", "Preprocessing & Modeling"),
  ]
}
