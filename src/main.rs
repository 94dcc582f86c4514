fn main() {
    dojo::cli::run();
}
