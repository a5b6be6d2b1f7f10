//! The `examscore init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("examscore.toml").exists() {
        println!("examscore.toml already exists, skipping.");
    } else {
        std::fs::write("examscore.toml", SAMPLE_CONFIG)?;
        println!("Created examscore.toml");
    }

    std::fs::create_dir_all("fixtures")?;
    let example_path = std::path::Path::new("fixtures/example.json");
    if example_path.exists() {
        println!("fixtures/example.json already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_FIXTURE)?;
        println!("Created fixtures/example.json");
    }

    println!("\nNext steps:");
    println!("  1. Adjust points and level cut points in examscore.toml");
    println!("  2. Run: examscore validate --fixture fixtures/example.json");
    println!(
        "  3. Run: examscore grade --fixture fixtures/example.json \
         --attempt attempt-1 --learner learner-1 --exam exam-1"
    );

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# examscore configuration

# Points per matched item. Override with EXAMSCORE_POINTS_<SKILL>.
[points_per_question]
grammar_vocabulary = 1.0
listening = 2.0
reading = 2.0
writing = 1.0
speaking = 1.0

# Bounds of teacher-entered writing and speaking scores.
[manual_score]
min = 0.0
max = 50.0

# Lowest score of each level; anything below a1 is A0.
[levels.listening]
a1 = 8.0
a2 = 16.0
b1 = 24.0
b2 = 34.0
c = 42.0

[levels.reading]
a1 = 8.0
a2 = 16.0
b1 = 26.0
b2 = 38.0
c = 46.0

[levels.writing]
a1 = 6.0
a2 = 18.0
b1 = 26.0
b2 = 40.0
c = 48.0

[levels.speaking]
a1 = 4.0
a2 = 16.0
b1 = 26.0
b2 = 41.0
c = 48.0
"#;

const EXAMPLE_FIXTURE: &str = r#"{
  "questions": [
    {
      "id": "l-1",
      "skill": "LISTENING",
      "answer_key": { "kind": "single-choice", "correct": "C" }
    },
    {
      "id": "r-1",
      "skill": "READING",
      "answer_key": {
        "kind": "pair-matching",
        "pairs": [
          { "left": "1", "right": "A" },
          { "left": "2", "right": "B" }
        ]
      }
    },
    {
      "id": "w-1",
      "skill": "WRITING",
      "answer_key": { "kind": "free-response" }
    }
  ],
  "submissions": [
    {
      "id": "s-1", "learner_id": "learner-1", "exam_id": "exam-1", "attempt_id": "attempt-1",
      "question_id": "l-1", "raw_answer": "C"
    },
    {
      "id": "s-2", "learner_id": "learner-1", "exam_id": "exam-1", "attempt_id": "attempt-1",
      "question_id": "r-1",
      "raw_answer": "[{\"left\":\"1\",\"right\":\"A\"},{\"left\":\"2\",\"right\":\"C\"}]"
    }
  ],
  "records": [
    { "id": "attempt-1", "learner_id": "learner-1", "session_id": "exam-1" }
  ]
}
"#;
