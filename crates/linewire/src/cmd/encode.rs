use linewire_frame::encode_message;

use crate::cmd::EncodeArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_encoded, OutputFormat};

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let mut fields = Vec::with_capacity(args.parts.len() + 1);
    fields.push(args.msg_type.as_str());
    fields.extend(args.parts.iter().map(String::as_str));

    print_encoded(&encode_message(&fields), format);
    Ok(SUCCESS)
}
