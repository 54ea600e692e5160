fn main() -> anyhow::Result<()> {
    review_queue::cli::run()
}
