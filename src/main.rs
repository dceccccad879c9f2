fn main() -> anyhow::Result<()>
{
        showcase::run()
}
