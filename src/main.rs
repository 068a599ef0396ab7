fn main() -> anyhow::Result<()> {
    vuh::cli::cli()
}
