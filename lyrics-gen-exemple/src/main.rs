use lyrics_gen_core::corpus::read_corpus;
use lyrics_gen_core::model::prediction_input::OutputMode;
use lyrics_gen_core::model::sampler::Flatten;
use lyrics_gen_core::{Generator, GeneratorConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Order 2 with back-off to the unigram model on unseen contexts
    let config = GeneratorConfig::default();

    // Read every .txt, .csv and .json file of the "data" directory
    let sentences = read_corpus("./data", &config.corpus);
    if sentences.is_empty() {
        println!("No lyrics found in ./data");
        return Ok(());
    }

    let mut app = Generator::new(&config)?;
    app.train(&sentences);
    println!("Trained on {} sentences", sentences.len());

    // Create a prediction input with default values (5 samples of 30 tokens max)
    let mut input = app.make_prediction_input();
    input.count = 3;
    input.max_length = 20;

    // Low temperature sticks to frequent transitions, high temperature flattens them
    for temperature in [0.5, 1.0, 2.0] {
        input.set_temperature(temperature)?;
        println!("--- temperature {} ---", temperature);
        for line in app.generate(&input)? {
            println!("{}", line);
        }
    }

    // Invalid temperatures are rejected
    match input.set_temperature(0.0) {
        Ok(_) => println!("Should not happen"),
        Err(e) => println!("{}", e),
    }

    // Power-law flattening keeps the ranking of frequent followers
    input.set_temperature(1.5)?;
    input.flatten = Flatten::PowerLaw;

    // A verse of 4 lines starting with a custom seed
    input.count = 1;
    input.max_length = 60;
    input.mode = OutputMode::verse(4);
    input.set_seed("i");
    println!("--- verse ---");
    for verse in app.generate(&input)? {
        println!("{}", verse);
    }

    // Save then reload the trained model set
    app.save("./models/demo.lgm")?;
    let reloaded = Generator::load("./models/demo.lgm", config.tokenizer)?;
    println!("Reloaded orders {:?}", reloaded.model().orders());

    Ok(())
}
