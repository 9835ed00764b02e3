use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    english_tutor::cli::main()
}
