use afp::process::read::Reader;
use afp::process::write::Writer;

use command::Cli;

pub mod command;
pub mod dump;
pub mod info;
pub mod progress;
pub mod roundtrip;

/// Reader configured from the global options.
pub fn reader_for(cli: &Cli) -> Reader {
    let mut reader = Reader::default();
    reader.set_fail_level(cli.fail_level());
    reader.set_charset(cli.charset.into());
    reader
}

pub fn writer_for(cli: &Cli) -> Writer {
    let mut writer = Writer::default();
    writer.set_charset(cli.charset.into());
    writer
}
