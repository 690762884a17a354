//! Built-in curriculum so the app is useful without a TOML lesson bank.
//!
//! Only a representative slice of each grammar topic is shipped here.

use std::collections::BTreeMap;

use crate::domain::{
  ConjugationTable, Exercise, Lesson, OptionSource, StepDef, StepOption, StepRole,
};

fn opt(key: &str, label: &str, gloss: &str) -> StepOption {
  StepOption::new(key, label, gloss)
}

fn fixed(options: Vec<StepOption>) -> OptionSource {
  OptionSource::Fixed { options }
}

fn depends_on(step: usize, entries: Vec<(&str, Vec<StepOption>)>) -> OptionSource {
  let by_key: BTreeMap<String, Vec<StepOption>> =
    entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
  OptionSource::DependsOn { step, by_key }
}

fn step(key: &str, title: &str, role: StepRole, options: OptionSource) -> StepDef {
  StepDef { key: key.into(), title: title.into(), role, options }
}

fn conj(table: &mut ConjugationTable, tense: &str, subject: &str, forms: &[(&str, &str)]) {
  let entry = table
    .entry(tense.to_string())
    .or_default()
    .entry(subject.to_string())
    .or_default();
  for (inf, form) in forms {
    entry.insert((*inf).to_string(), (*form).to_string());
  }
}

fn exercise(id: &str, sentence: &str, gloss: &str) -> Exercise {
  Exercise {
    id: id.into(),
    tokens: sentence.split_whitespace().map(str::to_string).collect(),
    gloss: gloss.into(),
  }
}

fn base_subjects() -> Vec<StepOption> {
  vec![
    opt("i", "I", "Yo"),
    opt("you", "You", "Tú"),
    opt("she", "She", "Ella"),
    opt("they", "They", "Ellos"),
  ]
}

pub fn seed_lessons() -> Vec<Lesson> {
  vec![
    present_simple(),
    present_continuous(),
    future_going_to(),
    modal_can(),
    past_simple(),
    comparatives(),
  ]
}

fn present_simple() -> Lesson {
  let verbs = |third_person: bool| {
    let (eat, play, read) = if third_person { ("eats", "plays", "reads") } else { ("eat", "play", "read") };
    vec![
      opt("eat", eat, "comer"),
      opt("play", play, "jugar").with_override("the_guitar", "tocar"),
      opt("read", read, "leer"),
    ]
  };

  let mut conjugations = ConjugationTable::new();
  conj(&mut conjugations, "present", "i", &[("comer", "como"), ("jugar", "juego"), ("tocar", "toco"), ("leer", "leo")]);
  conj(&mut conjugations, "present", "you", &[("comer", "comes"), ("jugar", "juegas"), ("tocar", "tocas"), ("leer", "lees")]);
  conj(&mut conjugations, "present", "she", &[("comer", "come"), ("jugar", "juega"), ("tocar", "toca"), ("leer", "lee")]);
  conj(&mut conjugations, "present", "they", &[("comer", "comen"), ("jugar", "juegan"), ("tocar", "tocan"), ("leer", "leen")]);

  Lesson {
    id: "present-simple".into(),
    title: "Present Simple".into(),
    topic: "Habits and routines".into(),
    order: 1,
    tense: "present".into(),
    steps: vec![
      step("subject", "Who?", StepRole::Subject, fixed(base_subjects())),
      step(
        "verb",
        "What do they do?",
        StepRole::Verb,
        depends_on(0, vec![("i", verbs(false)), ("you", verbs(false)), ("she", verbs(true)), ("they", verbs(false))]),
      ),
      step(
        "extra",
        "What?",
        StepRole::Extra,
        depends_on(1, vec![
          ("eat", vec![opt("apples", "apples", "manzanas"), opt("rice", "rice", "arroz")]),
          ("play", vec![opt("football", "football", "al fútbol"), opt("the_guitar", "the guitar", "la guitarra")]),
          ("read", vec![opt("books", "books", "libros"), opt("the_newspaper", "the newspaper", "el periódico")]),
        ]),
      ),
      step(
        "time",
        "How often?",
        StepRole::Time,
        fixed(vec![
          opt("every_day", "every day", "todos los días"),
          opt("on_weekends", "on weekends", "los fines de semana"),
        ]),
      ),
    ],
    conjugations,
    exercises: vec![
      exercise("ps-1", "Do you like apples ?", "¿Te gustan las manzanas?"),
      exercise("ps-2", "She plays the guitar .", "Ella toca la guitarra."),
      exercise("ps-3", "They read books every day .", "Ellos leen libros todos los días."),
    ],
  }
}

fn present_continuous() -> Lesson {
  Lesson {
    id: "present-continuous".into(),
    title: "Present Continuous".into(),
    topic: "Actions happening now".into(),
    order: 2,
    tense: "present".into(),
    steps: vec![
      step(
        "subject",
        "Who?",
        StepRole::Subject,
        fixed(vec![
          opt("i", "I am", "Yo estoy"),
          opt("she", "She is", "Ella está"),
          opt("we", "We are", "Nosotros estamos"),
          opt("they", "They are", "Ellos están"),
        ]),
      ),
      step(
        "verb",
        "Doing what?",
        StepRole::Verb,
        fixed(vec![
          opt("playing", "playing", "jugando").with_override("the_guitar", "tocando"),
          opt("reading", "reading", "leyendo"),
          opt("eating", "eating", "comiendo"),
        ]),
      ),
      step(
        "extra",
        "What?",
        StepRole::Extra,
        depends_on(1, vec![
          ("playing", vec![opt("football", "football", "al fútbol"), opt("the_guitar", "the guitar", "la guitarra")]),
          ("reading", vec![opt("a_book", "a book", "un libro"), opt("the_newspaper", "the newspaper", "el periódico")]),
          ("eating", vec![opt("an_apple", "an apple", "una manzana"), opt("pizza", "pizza", "pizza")]),
        ]),
      ),
      step(
        "time",
        "When?",
        StepRole::Time,
        fixed(vec![opt("now", "now", "ahora"), opt("at_the_moment", "at the moment", "en este momento")]),
      ),
    ],
    conjugations: ConjugationTable::new(),
    exercises: vec![
      exercise("pc-1", "She is reading a book now .", "Ella está leyendo un libro ahora."),
      exercise("pc-2", "Are they playing football ?", "¿Están jugando al fútbol?"),
    ],
  }
}

fn future_going_to() -> Lesson {
  Lesson {
    id: "future-going-to".into(),
    title: "Future: going to".into(),
    topic: "Plans and intentions".into(),
    order: 3,
    tense: "future".into(),
    steps: vec![
      step(
        "subject",
        "Who?",
        StepRole::Subject,
        fixed(vec![
          opt("i", "I am going to", "Yo voy a"),
          opt("she", "She is going to", "Ella va a"),
          opt("they", "They are going to", "Ellos van a"),
        ]),
      ),
      step(
        "verb",
        "Do what?",
        StepRole::Verb,
        fixed(vec![opt("visit", "visit", "visitar"), opt("study", "study", "estudiar"), opt("cook", "cook", "cocinar")]),
      ),
      step(
        "extra",
        "What?",
        StepRole::Extra,
        depends_on(1, vec![
          ("visit", vec![opt("my_grandmother", "my grandmother", "a mi abuela"), opt("london", "London", "Londres")]),
          ("study", vec![opt("english", "English", "inglés"), opt("maths", "maths", "matemáticas")]),
          ("cook", vec![opt("dinner", "dinner", "la cena"), opt("a_cake", "a cake", "un pastel")]),
        ]),
      ),
      step(
        "time",
        "When?",
        StepRole::Time,
        fixed(vec![opt("tomorrow", "tomorrow", "mañana"), opt("next_week", "next week", "la próxima semana")]),
      ),
    ],
    conjugations: ConjugationTable::new(),
    exercises: vec![
      exercise("fg-1", "I am going to study English tomorrow .", "Voy a estudiar inglés mañana."),
      exercise("fg-2", "Is she going to cook dinner ?", "¿Va a cocinar la cena?"),
    ],
  }
}

fn modal_can() -> Lesson {
  let mut conjugations = ConjugationTable::new();
  let forms = |a: &'static str, b: &'static str, c: &'static str, d: &'static str| {
    [("jugar", a), ("tocar", b), ("hablar", c), ("nadar", d)]
  };
  conj(&mut conjugations, "present", "i", &forms("juego", "toco", "hablo", "nado"));
  conj(&mut conjugations, "present", "you", &forms("juegas", "tocas", "hablas", "nadas"));
  conj(&mut conjugations, "present", "she", &forms("juega", "toca", "habla", "nada"));
  conj(&mut conjugations, "present", "they", &forms("juegan", "tocan", "hablan", "nadan"));

  Lesson {
    id: "modal-can".into(),
    title: "Modal verbs: can".into(),
    topic: "Abilities".into(),
    order: 4,
    tense: "present".into(),
    steps: vec![
      step("subject", "Who?", StepRole::Subject, fixed(base_subjects())),
      step(
        "verb",
        "Can do what?",
        StepRole::Verb,
        fixed(vec![
          opt("play", "can play", "jugar")
            .with_override("the_guitar", "tocar")
            .with_override("the_piano", "tocar"),
          opt("speak", "can speak", "hablar"),
          opt("swim", "can swim", "nadar"),
        ]),
      ),
      step(
        "extra",
        "What / how?",
        StepRole::Extra,
        depends_on(1, vec![
          ("play", vec![
            opt("the_guitar", "the guitar", "la guitarra"),
            opt("the_piano", "the piano", "el piano"),
            opt("football", "football", "al fútbol"),
          ]),
          ("speak", vec![opt("english", "English", "inglés"), opt("french", "French", "francés")]),
          ("swim", vec![opt("very_well", "very well", "muy bien"), opt("fast", "fast", "rápido")]),
        ]),
      ),
    ],
    conjugations,
    exercises: vec![
      exercise("mc-1", "She can play the guitar .", "Ella sabe tocar la guitarra."),
      exercise("mc-2", "Can you swim ?", "¿Sabes nadar?"),
      exercise("mc-3", "They can not speak French .", "Ellos no saben hablar francés."),
    ],
  }
}

fn past_simple() -> Lesson {
  let mut conjugations = ConjugationTable::new();
  conj(&mut conjugations, "past", "i", &[("visitar", "visité"), ("ver", "vi"), ("cocinar", "cociné")]);
  conj(&mut conjugations, "past", "she", &[("visitar", "visitó"), ("ver", "vio"), ("cocinar", "cocinó")]);
  conj(&mut conjugations, "past", "they", &[("visitar", "visitaron"), ("ver", "vieron"), ("cocinar", "cocinaron")]);

  Lesson {
    id: "past-simple".into(),
    title: "Past Simple".into(),
    topic: "Finished actions".into(),
    order: 5,
    tense: "past".into(),
    steps: vec![
      step(
        "subject",
        "Who?",
        StepRole::Subject,
        fixed(vec![opt("i", "I", "Yo"), opt("she", "She", "Ella"), opt("they", "They", "Ellos")]),
      ),
      step(
        "verb",
        "What did they do?",
        StepRole::Verb,
        fixed(vec![opt("visited", "visited", "visitar"), opt("watched", "watched", "ver"), opt("cooked", "cooked", "cocinar")]),
      ),
      step(
        "extra",
        "What?",
        StepRole::Extra,
        depends_on(1, vec![
          ("visited", vec![opt("my_grandmother", "my grandmother", "a mi abuela"), opt("the_museum", "the museum", "el museo")]),
          ("watched", vec![opt("a_movie", "a movie", "una película"), opt("the_game", "the game", "el partido")]),
          ("cooked", vec![opt("dinner", "dinner", "la cena"), opt("pasta", "pasta", "pasta")]),
        ]),
      ),
      step(
        "time",
        "When?",
        StepRole::Time,
        fixed(vec![opt("yesterday", "yesterday", "ayer"), opt("last_week", "last week", "la semana pasada")]),
      ),
    ],
    conjugations,
    exercises: vec![
      exercise("pa-1", "She watched a movie yesterday .", "Ella vio una película ayer."),
      exercise("pa-2", "Did you cook dinner ?", "¿Cocinaste la cena?"),
    ],
  }
}

fn comparatives() -> Lesson {
  let mut conjugations = ConjugationTable::new();
  conj(&mut conjugations, "present", "the_elephant", &[("ser", "es")]);
  conj(&mut conjugations, "present", "my_brother", &[("ser", "es")]);
  conj(&mut conjugations, "present", "this_car", &[("ser", "es")]);

  Lesson {
    id: "comparatives".into(),
    title: "Comparatives".into(),
    topic: "Comparing things".into(),
    order: 6,
    tense: "present".into(),
    steps: vec![
      step(
        "subject",
        "Who or what?",
        StepRole::Subject,
        fixed(vec![
          opt("the_elephant", "The elephant", "El elefante"),
          opt("my_brother", "My brother", "Mi hermano"),
          opt("this_car", "This car", "Este coche"),
        ]),
      ),
      step("verb", "Verb", StepRole::Verb, fixed(vec![opt("is", "is", "ser")])),
      step(
        "extra",
        "Compared how?",
        StepRole::Extra,
        fixed(vec![
          opt("bigger_than", "bigger than", "más grande que"),
          opt("taller_than", "taller than", "más alto que"),
          opt("faster_than", "faster than", "más rápido que"),
        ]),
      ),
      step(
        "object",
        "Than whom?",
        StepRole::Other,
        fixed(vec![
          opt("the_mouse", "the mouse", "el ratón"),
          opt("my_sister", "my sister", "mi hermana"),
          opt("that_bike", "that bike", "esa bicicleta"),
        ]),
      ),
    ],
    conjugations,
    exercises: vec![
      exercise("cp-1", "The elephant is bigger than the mouse .", "El elefante es más grande que el ratón."),
      exercise("cp-2", "Is your brother taller than you ?", "¿Tu hermano es más alto que tú?"),
    ],
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::builder::SentenceBuilder;
  use std::sync::Arc;

  fn lesson(id: &str) -> Arc<Lesson> {
    Arc::new(seed_lessons().into_iter().find(|l| l.id == id).unwrap())
  }

  #[test]
  fn lesson_ids_and_orders_are_unique() {
    let lessons = seed_lessons();
    let mut ids: Vec<_> = lessons.iter().map(|l| l.id.as_str()).collect();
    let mut orders: Vec<_> = lessons.iter().map(|l| l.order).collect();
    ids.sort();
    ids.dedup();
    orders.sort();
    orders.dedup();
    assert_eq!(ids.len(), lessons.len());
    assert_eq!(orders.len(), lessons.len());
  }

  #[test]
  fn dependent_steps_point_backwards() {
    for l in seed_lessons() {
      for (i, s) in l.steps.iter().enumerate() {
        if let Some(parent) = s.options.parent() {
          assert!(parent < i, "{} step {} depends forward", l.id, i);
        }
      }
    }
  }

  #[test]
  fn she_plays_the_guitar_glosses_with_tocar() {
    let mut b = SentenceBuilder::new(lesson("modal-can"));
    b.select(0, "she").unwrap();
    b.select(1, "play").unwrap();
    b.select(2, "the_guitar").unwrap();
    assert_eq!(b.preview(), "She can play the guitar");
    assert_eq!(b.gloss().as_deref(), Some("Ella toca la guitarra"));
  }

  #[test]
  fn football_keeps_the_default_verb() {
    let mut b = SentenceBuilder::new(lesson("modal-can"));
    b.select(0, "they").unwrap();
    b.select(1, "play").unwrap();
    b.select(2, "football").unwrap();
    assert_eq!(b.gloss().as_deref(), Some("Ellos juegan al fútbol"));
  }

  #[test]
  fn present_simple_verbs_agree_with_subject() {
    let mut b = SentenceBuilder::new(lesson("present-simple"));
    b.select(0, "she").unwrap();
    b.select(1, "read").unwrap();
    b.select(2, "books").unwrap();
    b.select(3, "every_day").unwrap();
    assert_eq!(b.preview(), "She reads books every day");
    assert_eq!(b.gloss().as_deref(), Some("Ella lee libros todos los días"));

    // A new subject changes the verb list, so everything after it is dropped.
    assert_eq!(b.select(0, "they").unwrap(), vec![1, 2, 3]);
    assert_eq!(b.preview(), "They");
  }

  #[test]
  fn past_simple_conjugates_in_past() {
    let mut b = SentenceBuilder::new(lesson("past-simple"));
    b.select(0, "they").unwrap();
    b.select(1, "cooked").unwrap();
    b.select(2, "dinner").unwrap();
    b.select(3, "yesterday").unwrap();
    assert_eq!(b.gloss().as_deref(), Some("Ellos cocinaron la cena ayer"));
  }

  #[test]
  fn comparatives_gloss() {
    let mut b = SentenceBuilder::new(lesson("comparatives"));
    b.select(0, "the_elephant").unwrap();
    b.select(1, "is").unwrap();
    b.select(2, "bigger_than").unwrap();
    b.select(3, "the_mouse").unwrap();
    assert_eq!(b.gloss().as_deref(), Some("El elefante es más grande que el ratón"));
  }
}
