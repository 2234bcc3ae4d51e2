use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("wenet {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: wenet");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!(
        "build_target: {}",
        option_env!("WENET_BUILD_TARGET").unwrap_or("unknown")
    );
    println!(
        "rustc: {}",
        option_env!("RUSTC_VERSION").unwrap_or("unknown")
    );
    println!("git_hash: {}", option_env!("GIT_HASH").unwrap_or("unknown"));
    println!(
        "features: tx={}, rx={}, async={}, cli=true",
        cfg!(feature = "tx"),
        cfg!(feature = "rx"),
        cfg!(feature = "async")
    );
    println!(
        "link: payload={} frame={} fec_frame={}",
        wenet_frame::PAYLOAD_SIZE,
        wenet_frame::FRAME_SIZE,
        wenet_frame::FEC_FRAME_SIZE
    );

    Ok(SUCCESS)
}
