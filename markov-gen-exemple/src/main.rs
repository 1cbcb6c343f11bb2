use log::info;
use markov_gen_core::MarkovError;
use markov_gen_core::io::{CORPUS_EXTENSIONS, list_files, resolve_data_dir};
use markov_gen_core::model::generation_input::{GenerationInput, Policy};
use markov_gen_core::model::generator::StartSeed;
use markov_gen_core::model::markov_model::MarkovModel;
use markov_gen_core::model::tokenizer::TokenizerMode;
use rand::SeedableRng;
use rand::rngs::StdRng;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Load every corpus (.txt one sentence per line, .json/.jsonl review dumps)
    // from the "data" directory and merge them into one model
    let folder = resolve_data_dir("data");
    let order = 2;
    let mut model = MarkovModel::empty(order);
    for file in list_files(&folder, &CORPUS_EXTENSIONS)? {
        model.merge(&MarkovModel::from_file(folder.join(&file), order)?)?;
    }
    info!("corpora: {:?}", model.corpus_names());

    // Fixed seed: the same corpus always prints the same sentences
    let mut rng = StdRng::seed_from_u64(2024);

    // Simple sentences ignore punctuation and sentence boundaries
    for mode in [TokenizerMode::Plain, TokenizerMode::PunctuationAware] {
        println!("simple ({:?}): {}", mode, model.simple_sentence(12, mode, &mut rng));
    }

    // Extendable sentences start like a sentence and, with 'extend',
    // keep going until '.', '!' or '?'
    let mut input = GenerationInput::default();
    input.policy = Policy::Extendable;
    input.max_steps = 10;
    input.extend = true;
    input.compact = true;

    let sentence = model.generate(&input, &mut rng)?;
    println!("extended: {}", sentence.render(input.compact));

    // The similarity check flags sentences that replay the corpus
    if !model.is_empty() {
        let report = model.most_similar_sentence(&sentence.compact())?;
        println!("closest ({:.3}): {}", report.score, report.closest_sentence);
    }

    // Starting from a chosen word
    input.set_starter("The")?;
    match model.generate(&input, &mut rng) {
        Ok(s) => println!("from 'The': {}", s.compact()),
        Err(e) => println!("from 'The': {e}"),
    }

    // A word that is not in the corpus is reported, not papered over
    match model.smarter_sentence(10, &StartSeed::Starter("xylophone".to_owned()), true, &mut rng) {
        Err(MarkovError::StarterNotFound { starter }) => println!("'{}' is not in the corpus", starter),
        Err(e) => println!("unexpected error: {e}"),
        Ok(s) => println!("Should not happen: {s}"),
    }

    // Several independent walks over the shared tables
    input.set_start_seed(StartSeed::SentenceStart)?;
    for (i, s) in model.generate_many(5, &input, &mut rng)?.iter().enumerate() {
        println!("batch sentence {}: {}", i + 1, s.compact());
    }

    Ok(())
}
