mod common;

use common::{failure, output};

#[test]
fn test_integer_arithmetic_stays_integer() {
    assert_eq!(output("mostre(2 + 3)\n"), "5\n");
    assert_eq!(output("mostre(7 - 10)\n"), "-3\n");
    assert_eq!(output("mostre(6 * 7)\n"), "42\n");
    assert_eq!(output("mostre(7 // 2)\n"), "3\n");
    assert_eq!(output("mostre(2 ** 10)\n"), "1024\n");
}

#[test]
fn test_true_division_is_float() {
    assert_eq!(output("mostre(4 / 2)\n"), "2.0\n");
    assert_eq!(output("mostre(1 / 4)\n"), "0.25\n");
}

#[test]
fn test_float_contagion() {
    assert_eq!(output("mostre(1 + 0.5)\n"), "1.5\n");
    assert_eq!(output("mostre(2.0 * 3)\n"), "6.0\n");
    assert_eq!(output("mostre(7.0 // 2)\n"), "3.0\n");
}

#[test]
fn test_modulo_follows_divisor_sign() {
    assert_eq!(output("mostre(7 % 3)\n"), "1\n");
    assert_eq!(output("mostre(-7 % 3)\n"), "2\n");
    assert_eq!(output("mostre(7 % -3)\n"), "-2\n");
}

#[test]
fn test_negative_exponent_is_float() {
    assert_eq!(output("mostre(2 ** -1)\n"), "0.5\n");
}

#[test]
fn test_division_by_zero_faults() {
    assert_eq!(failure("1 / 0\n").kind, "ZeroDivisionError");
    assert_eq!(failure("1 // 0\n").kind, "ZeroDivisionError");
    assert_eq!(failure("1 % 0\n").kind, "ZeroDivisionError");
}

#[test]
fn test_string_operators() {
    assert_eq!(output("mostre('ab' + 'cd')\n"), "abcd\n");
    assert_eq!(output("mostre('ab' * 3)\n"), "ababab\n");
    assert_eq!(output("mostre('x' * 0)\n"), "\n");
}

#[test]
fn test_list_and_tuple_concat() {
    assert_eq!(output("mostre([1] + [2, 3])\n"), "[1, 2, 3]\n");
    assert_eq!(output("mostre([0] * 3)\n"), "[0, 0, 0]\n");
    assert_eq!(output("mostre((1,) + (2,))\n"), "(1, 2)\n");
}

#[test]
fn test_mixed_operand_types_fault() {
    assert_eq!(failure("'a' + 1\n").kind, "TypeError");
    assert_eq!(failure("[1] + 'a'\n").kind, "TypeError");
}

#[test]
fn test_comparisons() {
    assert_eq!(output("mostre(1 < 2)\n"), "True\n");
    assert_eq!(output("mostre(2 <= 1)\n"), "False\n");
    assert_eq!(output("mostre('a' < 'b')\n"), "True\n");
    assert_eq!(output("mostre(1 == 1.0)\n"), "True\n");
    assert_eq!(output("mostre(1 != 2)\n"), "True\n");
    assert_eq!(output("mostre('1' == 1)\n"), "False\n");
}

#[test]
fn test_chained_comparisons() {
    assert_eq!(output("mostre(1 < 2 < 3)\n"), "True\n");
    assert_eq!(output("mostre(1 < 2 > 5)\n"), "False\n");
    assert_eq!(output("x = 5\nmostre(0 <= x <= 10)\n"), "True\n");
}

#[test]
fn test_ordering_between_mixed_types_faults() {
    assert_eq!(failure("1 < 'a'\n").kind, "TypeError");
}

#[test]
fn test_boolean_operators_return_operands() {
    assert_eq!(output("mostre(0 ou 'padrao')\n"), "padrao\n");
    assert_eq!(output("mostre(1 e 2)\n"), "2\n");
    assert_eq!(output("mostre(0 e 2)\n"), "0\n");
    assert_eq!(output("mostre(nao verdadeiro)\n"), "False\n");
    assert_eq!(output("mostre(não falso)\n"), "True\n");
}

#[test]
fn test_short_circuit_skips_effects() {
    assert_eq!(
        output("funcao efeito(): mostre('efeito'); retorne verdadeiro\nfalso e efeito()\n"),
        ""
    );
    assert_eq!(
        output("funcao efeito(): mostre('efeito'); retorne verdadeiro\nverdadeiro ou efeito()\n"),
        ""
    );
}

#[test]
fn test_membership() {
    assert_eq!(output("mostre('se' em 'presente')\n"), "True\n");
    assert_eq!(output("mostre(2 em [1, 2, 3])\n"), "True\n");
    assert_eq!(output("mostre(4 nao em [1, 2, 3])\n"), "True\n");
    assert_eq!(output("mostre('a' em {'a': 1})\n"), "True\n");
    assert_eq!(output("mostre('b' em {'a': 1})\n"), "False\n");
}

#[test]
fn test_unary_minus() {
    assert_eq!(output("mostre(-(3))\n"), "-3\n");
    assert_eq!(output("mostre(-2 ** 2)\n"), "-4\n");
    assert_eq!(failure("-'a'\n").kind, "TypeError");
}

#[test]
fn test_indexing() {
    assert_eq!(output("mostre([10, 20, 30][1])\n"), "20\n");
    assert_eq!(output("mostre([10, 20, 30][-1])\n"), "30\n");
    assert_eq!(output("mostre('casa'[0])\n"), "c\n");
    assert_eq!(failure("[1][5]\n").kind, "IndexError");
    assert_eq!(failure("[1]['a']\n").kind, "TypeError");
    assert_eq!(failure("{'a': 1}['b']\n").kind, "KeyError");
    assert_eq!(failure("1[0]\n").kind, "TypeError");
}

#[test]
fn test_truthiness_of_containers() {
    assert_eq!(output("mostre(nao [])\n"), "True\n");
    assert_eq!(output("mostre(nao [0])\n"), "False\n");
    assert_eq!(output("mostre(nao '')\n"), "True\n");
    assert_eq!(output("mostre(nao 0.0)\n"), "True\n");
    assert_eq!(output("mostre(nao nulo)\n"), "True\n");
}
