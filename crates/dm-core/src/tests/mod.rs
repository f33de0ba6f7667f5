mod assembler_tests;
