use std::io::Read;
use hocon_parse::{ParseOptions, Syntax, Tokenizer};
use hocon_tree::RenderOptions;

fn main() {
    let mut source = String::new();
    std::io::stdin().read_to_string(&mut source).unwrap();

    println!("=== Tokens ===");
    for tok in Tokenizer::new(&source, Syntax::Conf) {
        println!("{:?}", tok);
    }

    println!("\n=== Tree ===");
    match hocon_parse::parse_string(&source, &ParseOptions::new()) {
        Ok(value) => println!("{}", value.render(&RenderOptions::new().json(false))),
        Err(err) => eprintln!("{}", err.render("<stdin>", &source)),
    }
}
