fn main() {
    biosense_pipeline::cli::run();
}
