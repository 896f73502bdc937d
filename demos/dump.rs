//! Prints every record of a Bro log as one JSON object per line.
//!
//! Run with: cargo run --example dump -- /path/to/conn.log
//!
//! Without an argument a small built-in log is used.

use brolog::{from_path, from_str, LogReader};
use std::error::Error;
use std::io::BufRead;

const SAMPLE: &str = "#separator \\x09
#set_separator\t,
#empty_field\t(empty)
#unset_field\t-
#path\tconn
#fields\tts\tid.orig_h\tid.orig_p\tid.resp_h\tid.resp_p\tproto\tservice\ttunnel_parents
#types\ttime\taddr\tport\taddr\tport\tenum\tstring\tset[string]
1300475167.096535\t141.142.220.202\t5353\t224.0.0.251\t5353\tudp\tdns\t(empty)
1300475168.652003\t141.142.220.118\t35634\t208.80.152.2\t80\ttcp\t-\tCx1,Cx2
";

fn dump<R: BufRead>(reader: LogReader<R>) -> Result<(), Box<dyn Error>> {
    if let Some(path) = reader.path() {
        eprintln!("# path: {}", path);
    }
    if let Some(open) = reader.open() {
        eprintln!("# opened: {}", open);
    }

    for record in reader {
        match record {
            Ok(record) => println!("{}", serde_json::to_string(&record)?),
            Err(e) => eprintln!("skipping: {}", e),
        }
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    match std::env::args().nth(1) {
        Some(path) => dump(from_path(path)?),
        None => dump(from_str(SAMPLE)?),
    }
}
