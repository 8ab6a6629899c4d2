use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("linewire {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: linewire");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "target: {}",
        option_env!("LINEWIRE_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("delimiter: {}", linewire_frame::MSG_DELIMITER);
    println!(
        "max_line_length: {}",
        linewire_frame::DEFAULT_MAX_LINE_LENGTH
    );
    println!("features: async={}, cli=true", cfg!(feature = "async"));

    Ok(SUCCESS)
}
