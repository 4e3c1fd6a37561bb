//! Starter programs shown when a language is selected

use crate::language::Language;

pub fn sample_program(language: Language) -> &'static str {
    match language {
        Language::Javascript => {
            "// Using 'var' is discouraged.\n\
             var a = 1;\n\
             console.log('Initial a:', a);\n\
             \n\
             a = a + 10;\n\
             \n\
             console.log('Final a:', a);\n"
        }
        Language::Python => {
            "# Simple arithmetic and variable tracking\n\
             a = 1\n\
             b = 2\n\
             c = a + b\n\
             print(c)\n\
             \n\
             # String operations\n\
             name = \"World\"\n\
             greeting = \"Hello\"\n\
             message = greeting + \" \" + name\n\
             print(message)\n\
             \n\
             # More calculations\n\
             x = 10\n\
             y = 5\n\
             result = x * y + 3\n\
             print(\"Result:\", result)\n"
        }
        Language::Go => {
            "package main\n\
             \n\
             import \"fmt\"\n\
             \n\
             func main() {\n\
             \t// Simple arithmetic\n\
             \ta := 10\n\
             \tb := 20\n\
             \tsum := a + b\n\
             \tfmt.Println(\"Sum:\", sum)\n\
             \n\
             \t// More calculations\n\
             \tx := 5\n\
             \ty := 3\n\
             \tproduct := x * y\n\
             \tfmt.Println(\"Product:\", product)\n\
             }\n"
        }
        Language::Rust => {
            "fn main() {\n\
             \x20   // Simple arithmetic\n\
             \x20   let a = 5;\n\
             \x20   let b = 10;\n\
             \x20   let sum = a + b;\n\
             \x20   println!(\"Sum: {}\", sum);\n\
             \n\
             \x20   // More calculations\n\
             \x20   let x = 7;\n\
             \x20   let y = 3;\n\
             \x20   let product = x * y;\n\
             \x20   println!(\"Product: {}\", product);\n\
             }\n"
        }
        Language::Cpp => {
            "#include <iostream>\n\
             \n\
             int main() {\n\
             \x20   // Simple arithmetic\n\
             \x20   int a = 15;\n\
             \x20   int b = 25;\n\
             \x20   int sum = a + b;\n\
             \x20   std::cout << \"Sum: \" << sum << std::endl;\n\
             \n\
             \x20   // More calculations\n\
             \x20   int x = 8;\n\
             \x20   int y = 4;\n\
             \x20   int product = x * y;\n\
             \x20   std::cout << \"Product: \" << product << std::endl;\n\
             \n\
             \x20   return 0;\n\
             }\n"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::LANGUAGES;

    #[test]
    fn every_language_has_a_sample() {
        for language in LANGUAGES {
            assert!(!sample_program(language).trim().is_empty());
        }
    }
}
