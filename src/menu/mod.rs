use argp::FromArgs;

/// Top-level command.
#[derive(FromArgs, PartialEq, Debug)]
#[argp(description = "Converts Windows Metafile (WMF) files to SVG.")]
pub struct Wmf2Svg {
    #[argp(option, short = 'v', global, default = "0")]
    #[argp(
        description = "Logging level (0 = Off, 1 = Error, 2 = Warn, 3 = Info, 4 = Debug, 5 = Trace)"
    )]
    pub verbose: usize,

    #[argp(subcommand)]
    pub nested: Modules,
}

/// These are all the commands `wmf2svg` supports via command line.
#[derive(FromArgs, PartialEq, Debug)]
#[argp(subcommand)]
#[non_exhaustive]
pub enum Modules {
    Convert(ConvertOption),
    IdentifyFile(IdentifyOption),
}

/// Command to convert a WMF file into an SVG document.
#[derive(FromArgs, PartialEq, Debug)]
#[argp(subcommand, name = "convert")]
#[argp(description = "Convert a WMF file into an SVG document")]
pub struct ConvertOption {
    #[argp(positional)]
    #[argp(description = "Input WMF file to convert")]
    pub input: String,

    #[argp(positional)]
    #[argp(description = "Output SVG file (defaults to the input path with a .svg extension)")]
    pub output: Option<String>,

    #[argp(option, long = "namespace", default = "String::new()")]
    #[argp(description = "XML namespace prefix applied to every emitted tag")]
    pub namespace: String,

    #[argp(switch, long = "no-delimiter")]
    #[argp(description = "Omit the XML prolog, emitting a bare <svg> fragment")]
    pub no_delimiter: bool,

    #[argp(option, long = "width", default = "0")]
    #[argp(description = "Overrides the output canvas width in pixels")]
    pub width: u32,

    #[argp(option, long = "height", default = "0")]
    #[argp(description = "Overrides the output canvas height in pixels")]
    pub height: u32,
}

/// Command to try to identify what a given file is.
#[derive(FromArgs, PartialEq, Debug)]
#[argp(subcommand, name = "info")]
#[argp(description = "Identify a file and print relevant information")]
pub struct IdentifyOption {
    #[argp(switch, long = "deep")]
    #[argp(description = "Allow wmf2svg to do more compute-intensive operations when scanning.")]
    pub deep_scan: bool,

    //We always need an input file, output file can be optional with a default
    #[argp(positional)]
    #[argp(description = "Input file to be processed")]
    pub input: String,
}
