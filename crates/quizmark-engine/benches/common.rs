// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
#[allow(dead_code)]
pub fn generate_quiz(questions: usize) -> String {
    let mut content = String::from(
        "Quiz title: Benchmark quiz\nQuiz description: Generated for timing.\n\n  Second paragraph with *emphasis*.\n\nShuffle answers: true\n\n",
    );
    for i in 0..questions {
        match i % 4 {
            0 => content.push_str(&format!(
                "{}. What is {i} + {i}?\n*a) {}\nb) {}\n... Add them.\n\n",
                i + 1,
                i + i,
                i + i + 1
            )),
            1 => content.push_str(&format!(
                "Title: Pick several {i}\nPoints: 2\n{}. Which are even, set {i}?\n[*] {}\n[ ] {}\n[*] {}\n\n",
                i + 1,
                i * 2,
                i * 2 + 1,
                i * 2 + 2
            )),
            2 => content.push_str(&format!(
                "{}. Roughly {i}.5?\n= {i}.5 +- 0.25\n\n",
                i + 1
            )),
            _ => content.push_str(&format!(
                "{}. Spell {i}.\n* {i}\n* number {i}\n\n",
                i + 1
            )),
        }
    }
    content
}

#[allow(dead_code)]
pub fn generate_grouped_quiz(groups: usize, per_group: usize) -> String {
    let mut content = String::new();
    let mut n = 1;
    for g in 0..groups {
        content.push_str(&format!("Text: Section {g}\n\nGROUP\npick: 1\n"));
        for q in 0..per_group {
            content.push_str(&format!(
                "{n}. Group {g} question {q}?\n*a) right\nb) wrong\n\n"
            ));
            n += 1;
        }
        content.push_str("END_GROUP\n\n");
    }
    content
}
