use linewire_frame::{parse_message, FrameError};

use crate::cmd::DecodeArgs;
use crate::exit::{frame_error, CliResult, SUCCESS};
use crate::output::{print_message, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let line = args.line.trim_end_matches(['\r', '\n']);
    let message = parse_message(line).map_err(|err| frame_error("decode failed", err))?;

    if let Some(expected) = args.expect {
        if message.msg_type != expected {
            return Err(frame_error(
                "decode failed",
                FrameError::UnexpectedType {
                    expected,
                    actual: message.msg_type,
                },
            ));
        }
    }

    print_message(&message, None, format);
    Ok(SUCCESS)
}
