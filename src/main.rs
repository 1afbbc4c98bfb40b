use bpetok::{Granularity, Token, TokenId, Tokenizer, TokenizerConfig, VocabFormat};
use rayon::prelude::*;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

const VERSION: &str = env!("CARGO_PKG_VERSION");

struct Args {
    vocab: Option<String>,
    format: String,
    granularity: Option<String>,
    bos: Option<String>,
    eos: Option<String>,
    byte_fallback: bool,
    count: bool,
    json: bool,
    decode: Option<String>,
    help: bool,
    version: bool,
    paths: Vec<String>,
}

fn parse_args() -> Args {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    let mut args = Args {
        vocab: std::env::var("BPETOK_VOCAB").ok(),
        format: "binary".to_string(),
        granularity: None,
        bos: None,
        eos: None,
        byte_fallback: false,
        count: false,
        json: false,
        decode: None,
        help: false,
        version: false,
        paths: Vec::new(),
    };

    let mut i = 0;
    while i < argv.len() {
        match argv[i].as_str() {
            "-V" | "--version" => args.version = true,
            "-h" | "--help" => args.help = true,
            "-c" | "--count" => args.count = true,
            "-j" | "--json" => args.json = true,
            "--byte-fallback" => args.byte_fallback = true,
            "-v" | "--vocab" => args.vocab = Some(value(&argv, &mut i)),
            "-f" | "--format" => args.format = value(&argv, &mut i),
            "-g" | "--granularity" => args.granularity = Some(value(&argv, &mut i)),
            "--bos" => args.bos = Some(value(&argv, &mut i)),
            "--eos" => args.eos = Some(value(&argv, &mut i)),
            "-d" | "--decode" => args.decode = Some(value(&argv, &mut i)),
            s if s.starts_with('-') => fail(&format!("unknown option: {}", s)),
            _ => args.paths.push(argv[i].clone()),
        }
        i += 1;
    }
    args
}

fn value(argv: &[String], i: &mut usize) -> String {
    let flag = &argv[*i];
    *i += 1;
    match argv.get(*i) {
        Some(v) => v.clone(),
        None => fail(&format!("{} requires a value", flag)),
    }
}

fn fail(msg: &str) -> ! {
    eprintln!("Error: {}", msg);
    std::process::exit(1);
}

fn print_help() {
    println!(
        "Usage: bpetok -v <vocab> [options] [path...]\n\
         \n\
         Tokenize files or stdin with a BPE vocabulary.\n\
         \n\
         Options:\n\
         \x20 -v, --vocab <file>        Vocabulary file (or BPETOK_VOCAB)\n\
         \x20 -f, --format <name>       binary | rank (default: binary)\n\
         \x20 -g, --granularity <unit>  char | byte (default: by format)\n\
         \x20 --bos <token>             Prepend this token if it is in the vocabulary\n\
         \x20 --eos <token>             Append this token if it is in the vocabulary\n\
         \x20 --byte-fallback           Split unknown characters into <0xNN> tokens\n\
         \x20 -c, --count               Print token counts only\n\
         \x20 -j, --json                Print tokens as JSON\n\
         \x20 -d, --decode <ids>        Decode comma-separated ids and exit\n\
         \x20 -V, --version             Show version\n\
         \x20 -h, --help                Show this help\n\
         \n\
         When no paths are given, reads from stdin.\n\
         Set BPETOK_LOG=debug for loader diagnostics."
    );
}

fn parse_granularity(s: &str) -> Granularity {
    match s {
        "char" => Granularity::Char,
        "byte" => Granularity::Byte,
        other => fail(&format!("unknown granularity '{}' (expected char or byte)", other)),
    }
}

fn load_tokenizer(args: &Args) -> Tokenizer {
    let path = args
        .vocab
        .as_deref()
        .unwrap_or_else(|| fail("no vocabulary given (use -v or BPETOK_VOCAB)"));
    let format: VocabFormat = args.format.parse().unwrap_or_else(|e| fail(&format!("{}", e)));
    let data = fs::read(path).unwrap_or_else(|e| fail(&format!("reading {}: {}", path, e)));
    let config = TokenizerConfig {
        granularity: args.granularity.as_deref().map(parse_granularity),
        bos: args.bos.clone(),
        eos: args.eos.clone(),
        byte_fallback: args.byte_fallback,
    };
    Tokenizer::from_bytes(format, &data, config)
        .unwrap_or_else(|e| fail(&format!("loading {}: {}", path, e)))
}

fn format_line(count: &str, label: &str) -> String {
    format!("{:>8} {}\n", count, label)
}

fn tokens_json(tokens: &[Token]) -> serde_json::Value {
    serde_json::Value::Array(
        tokens
            .iter()
            .map(|t| serde_json::json!({ "text": t.text(), "id": t.id }))
            .collect(),
    )
}

fn run_decode(tok: &Tokenizer, list: &str) {
    let ids: Vec<TokenId> = list
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse()
                .unwrap_or_else(|_| fail(&format!("invalid token id '{}'", s)))
        })
        .collect();
    let bytes = tok
        .decode_ids(&ids)
        .unwrap_or_else(|e| fail(&format!("{}", e)));
    println!("{}", String::from_utf8_lossy(&bytes));
}

fn init_logging() {
    let env = env_logger::Env::new().filter_or("BPETOK_LOG", "warn");
    let _ = env_logger::Builder::from_env(env).try_init();
}

fn main() {
    init_logging();
    let args = parse_args();

    if args.version {
        println!("bpetok {}", VERSION);
        return;
    }
    if args.help {
        print_help();
        return;
    }

    let tok = load_tokenizer(&args);
    log::debug!(
        "vocabulary: {} entries, {:?} order, {:?} granularity",
        tok.vocab().len(),
        tok.vocab().order(),
        tok.granularity()
    );

    if let Some(list) = &args.decode {
        run_decode(&tok, list);
        return;
    }

    struct Input {
        name: Option<String>,
        text: String,
    }

    let inputs: Vec<Input> = if args.paths.is_empty() {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .unwrap_or_else(|e| fail(&format!("reading stdin: {}", e)));
        vec![Input { name: None, text: buf }]
    } else {
        args.paths
            .iter()
            .map(PathBuf::from)
            .map(|f| {
                let text = fs::read_to_string(&f)
                    .unwrap_or_else(|e| fail(&format!("reading {}: {}", f.display(), e)));
                Input {
                    name: Some(f.to_string_lossy().to_string()),
                    text,
                }
            })
            .collect()
    };

    // One shared vocabulary; each input gets its own sequence and queue.
    let encode_one = |input: &Input| tok.encode(&input.text);
    let results: Vec<bpetok::Result<Vec<Token>>> = if inputs.len() > 1 {
        inputs.par_iter().map(encode_one).collect()
    } else {
        inputs.iter().map(encode_one).collect()
    };

    let mut total = 0;
    for (input, result) in inputs.iter().zip(results) {
        let label = input.name.as_deref().unwrap_or("stdin");
        let tokens = result.unwrap_or_else(|e| fail(&format!("encoding {}: {}", label, e)));
        total += tokens.len();

        if args.count {
            print!("{}", format_line(&tokens.len().to_string(), input.name.as_deref().unwrap_or("")));
        } else if args.json {
            let obj = serde_json::json!({ "input": label, "tokens": tokens_json(&tokens) });
            println!("{}", obj);
        } else {
            let ids: Vec<String> = tokens.iter().map(|t| t.id.to_string()).collect();
            if inputs.len() > 1 {
                println!("{}: {}", label, ids.join(" "));
            } else {
                println!("{}", ids.join(" "));
            }
        }
    }

    if args.count && inputs.len() > 1 {
        print!("{}", format_line(&total.to_string(), "total"));
    }
}
